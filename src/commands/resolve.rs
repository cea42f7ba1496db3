use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, commit, finish, terminal_prompt};
use crate::cli::{GlobalOpts, ResolveOpts};
use crate::engine::{self, Strategy};
use crate::logging::Logger;

/// Commit message recorded after resolving.
pub const COMMIT_MESSAGE: &str = "Resolved conflicts via dotpilot";

/// Run the resolve command.
///
/// The strategy name is validated before anything is inspected.  Template
/// changes are committed when at least one conflict was handled.
///
/// # Errors
///
/// Returns an error for an unknown strategy, a missing template root, a
/// failed commit, or if any conflict failed to resolve.
pub fn run(global: &GlobalOpts, opts: &ResolveOpts, log: &Arc<Logger>) -> Result<()> {
    let strategy: Strategy = opts.strategy.parse()?;
    let setup = CommandSetup::init(global, log)?;
    let ctx = setup.context(log, terminal_prompt());

    let report = engine::resolve_conflicts(&ctx, strategy.name())?;
    if !report.outcomes.is_empty() {
        commit(&setup.tree.root, COMMIT_MESSAGE, log)?;
    }
    finish(log)
}
