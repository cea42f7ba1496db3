use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, finish, is_interactive, terminal_prompt};
use crate::cli::{ApplyOpts, GlobalOpts};
use crate::engine::{self, Context, ReconcileOptions};
use crate::logging::Logger;

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if the template root is missing, the state file cannot
/// be read or written, or any entry failed to apply.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &Arc<Logger>) -> Result<()> {
    let mut setup = CommandSetup::init(global, log)?;
    let options = reconcile_options(&setup.config.options, opts);
    let ctx = setup.context(log, terminal_prompt());
    apply_tree(&ctx, &mut setup, options)?;
    finish(log)
}

/// Apply the tree through `ctx` and persist new tracking entries.
///
/// # Errors
///
/// Returns an error if the template root is missing or the state file
/// cannot be written.
pub(super) fn apply_tree(
    ctx: &Context,
    setup: &mut CommandSetup,
    options: ReconcileOptions,
) -> Result<()> {
    if options.diff_prompt && !options.dry_run && !is_interactive() {
        ctx.log.warn("stdin is not a terminal; diverged files will be skipped (pass --no-diff-prompt to replace them)");
    }

    let report = engine::apply(ctx, options, &mut setup.config.tracking_paths)?;
    if report.problems > 0 {
        ctx.log.warn(&format!(
            "{} template path(s) could not be read",
            report.problems
        ));
    }

    if !options.dry_run {
        setup.save_if_dirty(ctx.log.as_ref())?;
    }
    Ok(())
}

/// Combine the state file options with the command-line overrides.
pub(super) fn reconcile_options(
    stored: &crate::config::Options,
    opts: &ApplyOpts,
) -> ReconcileOptions {
    ReconcileOptions {
        backup: stored.backup_before_overwrite && !opts.no_backup,
        diff_prompt: stored.prompt_on_diff && !opts.no_diff_prompt,
        dry_run: opts.dry_run,
    }
}
