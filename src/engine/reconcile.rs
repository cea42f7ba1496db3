//! Symlink reconciler: makes one live path link to one template file.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::config::TrackingList;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable as _, LiveBinding, Resource as _, ResourceChange, backup, diff};

/// Policy switches for [`reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Back up diverged live content before replacing it.
    pub backup: bool,
    /// Show a diff and ask before replacing diverged live content.
    pub diff_prompt: bool,
    /// Report what would change without touching anything.
    pub dry_run: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            backup: true,
            diff_prompt: false,
            dry_run: false,
        }
    }
}

/// Ensure `live` is a symlink to `template`.
///
/// Absent paths are linked; correct links are left alone.  Diverged paths
/// (foreign content or a link elsewhere) are optionally confirmed via the
/// prompt, backed up, then replaced.  A declined confirmation or a real
/// directory in the way yields [`ResourceChange::Skipped`].  Every link
/// created is registered in `tracking`.
///
/// # Errors
///
/// Returns an error if the live path cannot be inspected, backed up, or
/// replaced.
pub fn reconcile(
    ctx: &Context,
    template: &Path,
    live: &Path,
    opts: ReconcileOptions,
    tracking: &mut TrackingList,
) -> Result<ResourceChange> {
    let resource = SymlinkResource::new(template.to_path_buf(), live.to_path_buf());
    let shown = ctx.display(live);

    let state = resource.current_state()?;
    match &state {
        LiveBinding::LinkedCorrect => {
            ctx.log.debug(&format!("ok: {shown}"));
            return Ok(ResourceChange::AlreadyCorrect);
        }
        LiveBinding::Absent => {
            if opts.dry_run {
                ctx.log.dry_run(&format!("would link {}", resource.description()));
                return Ok(ResourceChange::Applied);
            }
        }
        LiveBinding::Foreign | LiveBinding::LinkedStale { .. } => {
            if resource.target_is_real_dir() {
                ctx.log.warn(&format!(
                    "{shown} is a directory; not replacing it with a link to {}",
                    template.display()
                ));
                return Ok(ResourceChange::Skipped {
                    reason: "a directory exists at the live path".to_string(),
                });
            }
            if opts.dry_run {
                ctx.log
                    .dry_run(&format!("would replace {shown} with link to {}", template.display()));
                return Ok(ResourceChange::Applied);
            }
            if opts.diff_prompt && !confirm_replace(ctx, template, live, &shown)? {
                ctx.log.info(&format!("skipping {shown}"));
                return Ok(ResourceChange::Skipped {
                    reason: "declined".to_string(),
                });
            }
            if opts.backup
                && let Some(saved) = backup::backup_file(live)
                    .with_context(|| format!("backing up {}", live.display()))?
            {
                ctx.log
                    .info(&format!("backed up {shown} to {}", saved.display()));
            }
        }
    }

    resource.apply()?;
    ctx.log.debug(&format!("linked {}", resource.description()));
    tracking.insert(ctx.home_relative(live));
    Ok(ResourceChange::Applied)
}

/// Show the diff between `live` and `template` and ask to proceed.
///
/// A live path whose content cannot be read (such as a dangling link) is
/// replaced without asking.
fn confirm_replace(ctx: &Context, template: &Path, live: &Path, shown: &str) -> Result<bool> {
    if std::fs::metadata(live).is_err() {
        return Ok(true);
    }
    match diff::file_diff(live, template) {
        Ok(text) => {
            ctx.prompt.show(&format!("Diff for {shown}:\n{text}"));
            ctx.prompt.confirm(&format!("Apply changes to {shown}?"), false)
        }
        Err(e) => {
            ctx.log.warn(&format!("failed to diff {shown}: {e:#}"));
            Ok(true)
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::engine::test_helpers::{Fixture, backups_of};
    use crate::prompt::test_helpers::Answer;

    #[test]
    fn links_absent_path_and_tracks_it() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.home().join(".vimrc");
        let mut tracking = TrackingList::default();

        let change =
            reconcile(&fx.ctx(), &tpl, &live, ReconcileOptions::default(), &mut tracking).unwrap();
        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(std::fs::read_link(&live).unwrap(), tpl);
        assert!(tracking.contains(Path::new(".vimrc")));
    }

    #[test]
    fn correct_link_is_noop() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.home().join(".vimrc");
        let mut tracking = TrackingList::default();
        let ctx = fx.ctx();
        reconcile(&ctx, &tpl, &live, ReconcileOptions::default(), &mut tracking).unwrap();

        let change =
            reconcile(&ctx, &tpl, &live, ReconcileOptions::default(), &mut tracking).unwrap();
        assert_eq!(change, ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn foreign_file_is_backed_up_then_replaced() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let mut tracking = TrackingList::default();

        reconcile(&fx.ctx(), &tpl, &live, ReconcileOptions::default(), &mut tracking).unwrap();

        assert_eq!(std::fs::read_link(&live).unwrap(), tpl);
        let backups = backups_of(&live);
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), "B");
    }

    #[test]
    fn no_backup_when_disabled() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let opts = ReconcileOptions {
            backup: false,
            ..ReconcileOptions::default()
        };
        reconcile(&fx.ctx(), &tpl, &live, opts, &mut TrackingList::default()).unwrap();
        assert!(backups_of(&live).is_empty());
    }

    #[test]
    fn declined_prompt_leaves_file_untouched() {
        let fx = Fixture::new().with_answers([Answer::Confirm(false)]);
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let opts = ReconcileOptions {
            diff_prompt: true,
            ..ReconcileOptions::default()
        };
        let mut tracking = TrackingList::default();

        let change = reconcile(&fx.ctx(), &tpl, &live, opts, &mut tracking).unwrap();
        assert!(matches!(change, ResourceChange::Skipped { .. }));
        assert_eq!(std::fs::read_to_string(&live).unwrap(), "B");
        assert!(!live.symlink_metadata().unwrap().is_symlink());
        assert!(backups_of(&live).is_empty());
        assert!(tracking.is_empty());
        assert_eq!(fx.prompt.shown(), vec!["Diff for ~/.vimrc:\n- B\n+ A\n"]);
    }

    #[test]
    fn confirmed_prompt_replaces() {
        let fx = Fixture::new().with_answers([Answer::Confirm(true)]);
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let opts = ReconcileOptions {
            diff_prompt: true,
            ..ReconcileOptions::default()
        };
        let change =
            reconcile(&fx.ctx(), &tpl, &live, opts, &mut TrackingList::default()).unwrap();
        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(std::fs::read_to_string(&live).unwrap(), "A");
    }

    #[test]
    fn real_directory_in_the_way_is_skipped() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.config", "file");
        let live = fx.home().join(".config");
        std::fs::create_dir_all(live.join("keep")).unwrap();

        let change = reconcile(
            &fx.ctx(),
            &tpl,
            &live,
            ReconcileOptions::default(),
            &mut TrackingList::default(),
        )
        .unwrap();
        assert!(matches!(change, ResourceChange::Skipped { .. }));
        assert!(live.join("keep").is_dir());
    }

    #[test]
    fn dry_run_mutates_nothing() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let absent = fx.home().join(".bashrc");
        let opts = ReconcileOptions {
            dry_run: true,
            ..ReconcileOptions::default()
        };
        let mut tracking = TrackingList::default();
        let ctx = fx.ctx();

        assert_eq!(
            reconcile(&ctx, &tpl, &live, opts, &mut tracking).unwrap(),
            ResourceChange::Applied
        );
        assert_eq!(
            reconcile(&ctx, &tpl, &absent, opts, &mut tracking).unwrap(),
            ResourceChange::Applied
        );
        assert_eq!(std::fs::read_to_string(&live).unwrap(), "B");
        assert!(absent.symlink_metadata().is_err());
        assert!(backups_of(&live).is_empty());
        assert!(tracking.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn stale_link_is_relinked() {
        let fx = Fixture::new();
        let common = fx.template("common/.vimrc", "A");
        let machine = fx.template("machine/box/.vimrc", "C");
        let live = fx.home().join(".vimrc");
        std::os::unix::fs::symlink(&common, &live).unwrap();

        reconcile(
            &fx.ctx(),
            &machine,
            &live,
            ReconcileOptions::default(),
            &mut TrackingList::default(),
        )
        .unwrap();
        assert_eq!(std::fs::read_link(&live).unwrap(), machine);
        assert_eq!(std::fs::read_to_string(&common).unwrap(), "A");
    }
}
