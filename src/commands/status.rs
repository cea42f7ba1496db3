use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::engine;
use crate::logging::Logger;
use crate::prompt::AutoPrompt;
use crate::repository;

/// State of the template tree's repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepoState {
    Clean,
    Dirty,
    Missing,
}

/// Snapshot printed by `dotpilot status`.
#[derive(Debug)]
struct Status {
    environment: Option<String>,
    hostname: String,
    root: PathBuf,
    tracked: Vec<PathBuf>,
    conflicts: usize,
    repository: RepoState,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Current environment: {}",
            self.environment.as_deref().unwrap_or("(none)")
        )?;
        writeln!(f, "Machine hostname: {}", self.hostname)?;
        writeln!(f, "Template root: {}", self.root.display())?;
        writeln!(f, "Tracked paths: {}", self.tracked.len())?;
        for path in &self.tracked {
            if path.is_absolute() {
                writeln!(f, "  {}", path.display())?;
            } else {
                writeln!(f, "  ~/{}", path.display())?;
            }
        }
        writeln!(f, "Conflicts: {}", self.conflicts)?;
        match self.repository {
            RepoState::Clean => write!(f, "Repository is clean, no uncommitted changes."),
            RepoState::Dirty => write!(f, "Repository has uncommitted changes."),
            RepoState::Missing => write!(f, "Template root is not a git repository."),
        }
    }
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the template root is missing or its repository
/// status cannot be read.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    setup.tree.ensure_exists()?;
    let ctx = setup.context(log, Arc::new(AutoPrompt(false)));

    let repository = if repository::open(&setup.tree.root)?.is_none() {
        RepoState::Missing
    } else if repository::has_changes(&setup.tree.root)? {
        RepoState::Dirty
    } else {
        RepoState::Clean
    };

    let status = Status {
        environment: setup.tree.environment.clone(),
        hostname: setup.tree.hostname.clone(),
        root: setup.tree.root.clone(),
        tracked: setup
            .config
            .tracking_paths
            .iter()
            .map(PathBuf::from)
            .collect(),
        conflicts: engine::detect_conflicts(&ctx)?.len(),
        repository,
    };
    println!("{status}");
    Ok(())
}
