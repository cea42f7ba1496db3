use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::{CommandSetup, commit};
use crate::cli::{GlobalOpts, InitOpts};
use crate::config::DEFAULT_ENVIRONMENT;
use crate::logging::Logger;
use crate::repository;
use crate::template::TemplateTree;

/// Commit message recorded for a freshly scaffolded tree.
pub const COMMIT_MESSAGE: &str = "Initialized dotpilot repository";

/// Placeholder keeping empty tier directories in version control.
const KEEP_FILE: &str = ".gitkeep";

const README: &str = "# dotfiles\n\n\
Managed by dotpilot. Files under `common/` apply everywhere, files under\n\
`envs/<name>/` apply to that environment, and files under\n\
`machine/<hostname>/` apply to a single machine. Later tiers win.\n";

/// Run the init command.
///
/// Clones `--remote` when given, otherwise creates an empty repository.
/// Either way the tier directories for the current environment and host
/// are created and the state file records the environment.
///
/// # Errors
///
/// Returns an error if the root already exists without `--force`, or
/// cloning, scaffolding, committing, or saving the state file fails.
pub fn run(global: &GlobalOpts, opts: &InitOpts, log: &Arc<Logger>) -> Result<()> {
    let mut setup = CommandSetup::init(global, log)?;
    let environment = setup
        .tree
        .environment
        .clone()
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
    setup.tree = TemplateTree::new(
        setup.tree.root.clone(),
        Some(environment.clone()),
        setup.tree.hostname.clone(),
    );
    let root = setup.tree.root.clone();

    if root.exists() {
        if !opts.force {
            anyhow::bail!(
                "{} already exists; pass --force to reinitialize",
                root.display()
            );
        }
        log.warn(&format!("removing existing {}", root.display()));
        std::fs::remove_dir_all(&root)
            .with_context(|| format!("removing {}", root.display()))?;
    }

    if let Some(url) = &opts.remote {
        log.stage(&format!("Cloning {url}"));
        repository::clone(url, &root)?;
        setup.config.remote_repository = Some(url.clone());
    } else {
        log.stage(&format!("Creating {}", root.display()));
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating {}", root.display()))?;
        repository::init(&root)?;
        setup.config.remote_repository = None;
    }

    scaffold(&setup.tree)?;
    commit(&root, COMMIT_MESSAGE, log)?;

    setup.config.current_environment = environment;
    setup.config.save(&setup.config_path)?;
    log.info(&format!(
        "initialized {}; run 'dotpilot apply' to link it",
        root.display()
    ));
    Ok(())
}

/// Create the tier directories for this tree's view plus a README.
///
/// Existing files are left untouched.
fn scaffold(tree: &TemplateTree) -> Result<()> {
    for tier in tree.tiers() {
        let dir = tree.tier_root(&tier);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        write_if_missing(&dir.join(KEEP_FILE), "")?;
    }
    write_if_missing(&tree.root.join("README.md"), README)
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if !path.exists() {
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
