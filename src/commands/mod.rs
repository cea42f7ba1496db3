pub mod apply;
pub mod completions;
pub mod conflicts;
pub mod init;
pub mod resolve;
pub mod status;
pub mod sync;
pub mod track;
pub mod version;

use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::engine::Context;
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::prompt::{AutoPrompt, Prompt, TerminalPrompt};
use crate::repository;
use crate::template::TemplateTree;

/// Shared state produced by the common command setup sequence.
///
/// Resolves the home directory, state file, template root, environment and
/// hostname so that each command does not repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    pub home: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
    pub tree: TemplateTree,
}

impl CommandSetup {
    /// Load the state file and resolve the template tree view.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory or hostname cannot be
    /// determined, or the state file fails to parse.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let home = config::home_dir()?;
        let cwd = std::env::current_dir().context("reading current directory")?;
        let config_path = global.config.as_deref().map_or_else(
            || Config::default_path(&home),
            |path| config::absolute_from(&cwd, path),
        );
        let config = Config::load(&config_path)?;
        let root = config::resolve_root(global.root.as_deref(), &home, &cwd);
        let environment = global
            .environment
            .clone()
            .or_else(|| config.environment().map(String::from));
        let hostname = config::resolve_hostname(global.hostname.as_deref())?;

        log.debug(&format!("state file: {}", config_path.display()));
        log.debug(&format!("template root: {}", root.display()));
        log.debug(&format!(
            "environment: {}, hostname: {hostname}",
            environment.as_deref().unwrap_or("(none)")
        ));
        let skip = global.tier_skips();
        if skip.any() {
            let tiers = [
                (skip.common, "common"),
                (skip.environment, "env"),
                (skip.machine, "machine"),
            ];
            let named: Vec<&str> = tiers.iter().filter(|(s, _)| *s).map(|(_, n)| *n).collect();
            log.warn(&format!("skipping tiers: {}", named.join(", ")));
        }

        Ok(Self {
            home,
            config_path,
            config,
            tree: TemplateTree::new(root, environment, hostname).with_skips(skip),
        })
    }

    /// Engine context over this setup with real processes and `prompt`.
    #[must_use]
    pub fn context(&self, log: &Arc<Logger>, prompt: Arc<dyn Prompt>) -> Context {
        let log: Arc<dyn Log> = log.clone();
        Context::new(
            self.home.clone(),
            self.tree.clone(),
            log,
            prompt,
            Arc::new(SystemExecutor),
        )
        .with_editor(std::env::var("EDITOR").ok())
    }

    /// Persist the state file if the tracking list grew.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn save_if_dirty(&self, log: &dyn Log) -> Result<()> {
        if self.config.tracking_paths.is_dirty() {
            self.config.save(&self.config_path)?;
            log.debug(&format!("saved {}", self.config_path.display()));
        }
        Ok(())
    }
}

/// `true` when stdin is attached to a terminal.
#[must_use]
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Terminal prompt when stdin is interactive, otherwise one that declines.
#[must_use]
pub fn terminal_prompt() -> Arc<dyn Prompt> {
    if is_interactive() {
        Arc::new(TerminalPrompt)
    } else {
        Arc::new(AutoPrompt(false))
    }
}

/// Commit the template tree if it is a repository with changes.
///
/// A tree that is not a repository is reported as a warning.
///
/// # Errors
///
/// Returns an error if staging or committing fails.
pub fn commit(root: &Path, message: &str, log: &Logger) -> Result<()> {
    if repository::open(root)?.is_none() {
        log.warn(&format!(
            "{} is not a git repository; changes not committed",
            root.display()
        ));
        return Ok(());
    }
    log.stage("Committing changes");
    match repository::commit_changes(root, message)? {
        Some(oid) => log.info(&format!("committed {oid}: {message}")),
        None => log.info("nothing to commit"),
    }
    Ok(())
}

/// Print the summary and bail if any entry failed.
///
/// # Errors
///
/// Returns an error if one or more entries recorded a failure.
pub fn finish(log: &Logger) -> Result<()> {
    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} item(s) failed");
    }
    Ok(())
}
