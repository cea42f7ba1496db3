use std::sync::Arc;

use anyhow::Result;

use super::apply::{apply_tree, reconcile_options};
use super::{CommandSetup, commit, finish, terminal_prompt};
use crate::cli::{GlobalOpts, SyncOpts};
use crate::engine::{self, Context, Strategy};
use crate::logging::Logger;
use crate::repository::{self, PullOutcome, REMOTE};

/// Commit message for template edits made since the last commit.
pub const AUTO_COMMIT_MESSAGE: &str = "Auto-commit before sync";

/// Commit message for changes made while syncing.
pub const COMMIT_MESSAGE: &str = "Synced dotfiles via dotpilot";

/// Run the sync command.
///
/// Commits pending template edits, pulls, applies, checks for conflicts,
/// commits again and pushes.  The strategy name is validated before
/// anything else happens.
///
/// # Errors
///
/// Returns an error for an unknown strategy, a template root that is not
/// a repository, a failed pull, commit or push, or if any entry failed.
pub fn run(global: &GlobalOpts, opts: &SyncOpts, log: &Arc<Logger>) -> Result<()> {
    let strategy = opts
        .resolve_conflicts
        .then(|| opts.strategy.parse::<Strategy>())
        .transpose()?;
    let mut setup = CommandSetup::init(global, log)?;
    let ctx = setup.context(log, terminal_prompt());
    sync(&ctx, &mut setup, opts, strategy, log)?;
    finish(log)
}

fn sync(
    ctx: &Context,
    setup: &mut CommandSetup,
    opts: &SyncOpts,
    strategy: Option<Strategy>,
    log: &Logger,
) -> Result<()> {
    setup.tree.ensure_exists()?;
    let root = setup.tree.root.clone();
    if repository::open(&root)?.is_none() {
        anyhow::bail!(
            "{} is not a git repository; run `dotpilot init --remote <url>` first",
            root.display()
        );
    }
    let dry_run = opts.apply.dry_run;

    if repository::has_changes(&root)? {
        if dry_run {
            log.dry_run("would commit uncommitted template changes");
        } else {
            commit(&root, AUTO_COMMIT_MESSAGE, log)?;
        }
    }

    if opts.no_pull {
        log.info("skipping pull");
    } else if dry_run {
        log.dry_run(&format!("would pull from {REMOTE}"));
    } else {
        log.stage(&format!("Pulling from {REMOTE}"));
        match repository::pull(&root, REMOTE)? {
            PullOutcome::UpToDate => log.info("already up to date"),
            PullOutcome::FastForwarded(oid) => log.info(&format!("fast-forwarded to {oid}")),
            PullOutcome::NoRemoteBranch => {
                log.info(&format!("{REMOTE} has no branch to pull yet"));
            }
        }
    }

    let options = reconcile_options(&setup.config.options, &opts.apply);
    apply_tree(ctx, setup, options)?;

    match strategy {
        Some(strategy) if dry_run => {
            log.dry_run(&format!("would resolve conflicts with {strategy}"));
        }
        Some(strategy) => {
            engine::resolve_conflicts(ctx, strategy.name())?;
        }
        None => {
            let remaining = engine::detect_conflicts(ctx)?.len();
            if remaining > 0 {
                log.warn(&format!(
                    "{remaining} conflict(s) remain; run `dotpilot resolve`"
                ));
            }
        }
    }

    if dry_run {
        log.dry_run(&format!("would commit and push to {REMOTE}"));
        return Ok(());
    }
    commit(&root, COMMIT_MESSAGE, log)?;

    if opts.no_push {
        log.info("skipping push");
    } else {
        log.stage(&format!("Pushing to {REMOTE}"));
        if repository::push(&root, REMOTE)? {
            log.info(&format!("pushed to {REMOTE}"));
        } else {
            log.info("nothing to push yet");
        }
    }
    Ok(())
}
