use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::{CommandSetup, commit, finish, terminal_prompt};
use crate::cli::{GlobalOpts, TrackOpts};
use crate::engine;
use crate::logging::{Logger, Outcome};
use crate::resources::ResourceChange;
use crate::template::{TemplateTree, Tier};

/// Commit message recorded after tracking.
pub const COMMIT_MESSAGE: &str = "Added tracked files via dotpilot";

/// Run the track command.
///
/// Each path is tracked independently; a failure is logged and the next
/// path is attempted.  The template tree is committed afterwards.
///
/// # Errors
///
/// Returns an error if the template root is missing, the state file cannot
/// be written, committing fails, or any path failed to track.
pub fn run(global: &GlobalOpts, opts: &TrackOpts, log: &Arc<Logger>) -> Result<()> {
    let mut setup = CommandSetup::init(global, log)?;
    setup.tree.ensure_exists()?;
    let cwd = std::env::current_dir().context("resolving current directory")?;

    let tier = Tier::select(
        opts.tier.as_deref(),
        setup.tree.environment.as_deref(),
        &setup.tree.hostname,
    );
    log.stage(&format!("Tracking into {tier}"));

    let ctx = setup.context(log, terminal_prompt());
    for raw in &opts.paths {
        let source = expand_source(raw, &setup.home, &cwd);
        let dest = destination(opts.dest.as_deref(), &setup.tree, &tier, &setup.home, &source);
        let shown = ctx.display(&source);
        log.debug(&format!("{} -> {}", source.display(), dest.display()));

        match engine::track(
            &ctx,
            &source,
            &dest,
            opts.overwrite,
            &mut setup.config.tracking_paths,
        ) {
            Ok(ResourceChange::AlreadyCorrect) => {
                log.info(&format!("{shown} is already tracked"));
                log.record(&shown, Outcome::Ok, None);
            }
            Ok(_) => log.record(&shown, Outcome::Ok, None),
            Err(e) => {
                log.error(&format!("failed to track {shown}: {e:#}"));
                log.record(&shown, Outcome::Failed, Some(&format!("{e:#}")));
            }
        }
    }

    setup.save_if_dirty(log.as_ref())?;
    commit(&setup.tree.root, COMMIT_MESSAGE, log)?;
    finish(log)
}

/// Expand a leading `~` to `home` and anchor relative paths at `cwd`.
///
/// Symlinks are not resolved, so tracking an existing link tracks the link.
fn expand_source(raw: &Path, home: &Path, cwd: &Path) -> PathBuf {
    let expanded = match raw.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => raw.to_path_buf(),
    };
    if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    }
}

/// Template destination: an explicit `--dest` (relative to the root), or the
/// mirror of `source` inside `tier`.
fn destination(
    explicit: Option<&Path>,
    tree: &TemplateTree,
    tier: &Tier,
    home: &Path,
    source: &Path,
) -> PathBuf {
    match explicit {
        Some(dest) if dest.is_absolute() => dest.to_path_buf(),
        Some(dest) => tree.root.join(dest),
        None => tree.destination_for(tier, home, source),
    }
}
