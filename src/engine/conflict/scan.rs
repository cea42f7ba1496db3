//! Conflict Scanner.
use anyhow::Result;

use super::ConflictRecord;
use crate::engine::Context;
use crate::resources::Resource as _;
use crate::resources::diff::file_diff_lossy;
use crate::resources::symlink::SymlinkResource;

/// Classify every layered template file and report the diverged ones.
///
/// Read-only.  Overlapping tiers are collapsed first, so each live path is
/// checked once against its highest-precedence template.  Paths that cannot
/// be inspected are logged and left out.
///
/// # Errors
///
/// Returns an error only if the template root does not exist.
pub fn detect_conflicts(ctx: &Context) -> Result<Vec<ConflictRecord>> {
    ctx.tree.ensure_exists()?;
    let walk = ctx.tree.layered(&ctx.home);
    for problem in &walk.problems {
        ctx.log
            .warn(&format!("skipping {}: {}", problem.path.display(), problem.error));
    }

    let mut conflicts = Vec::new();
    for entry in walk.entries.into_iter().filter(|e| !e.is_dir) {
        let link = SymlinkResource::new(entry.template.clone(), entry.live.clone());
        let binding = match link.current_state() {
            Ok(binding) => binding,
            Err(e) => {
                ctx.log
                    .warn(&format!("cannot inspect {}: {e:#}", ctx.display(&entry.live)));
                continue;
            }
        };
        if !binding.is_conflict() {
            continue;
        }
        ctx.log.debug(&format!("conflict: {}", ctx.display(&entry.live)));
        let diff = file_diff_lossy(&entry.live, &entry.template);
        conflicts.push(ConflictRecord {
            live: entry.live,
            template: entry.template,
            tier: entry.tier,
            binding,
            diff,
        });
    }
    Ok(conflicts)
}
