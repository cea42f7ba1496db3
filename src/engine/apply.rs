//! Layered Application Engine.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::reconcile::{ReconcileOptions, reconcile};
use super::{BatchStats, Context, Failure};
use crate::config::TrackingList;
use crate::logging::Outcome;
use crate::resources::directory::DirectoryResource;
use crate::resources::{Applicable as _, ResourceChange};
use crate::template::TemplateEntry;

/// Outcome of [`apply`].
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Per-entry outcome counters.
    pub stats: BatchStats,
    /// Entries that failed; the walk continued past each one.
    pub failures: Vec<Failure>,
    /// Template entries that could not be enumerated or mapped.
    pub problems: usize,
}

impl ApplyReport {
    /// `true` when no entry failed.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Project the template tree onto the home directory.
///
/// Tiers are layered common, environment, machine; for each live path only
/// the last tier's entry is reconciled.  Directories are mirrored, files are
/// linked through [`reconcile`].  A failing entry is logged and recorded in
/// the report and the walk continues.  Re-running with nothing changed
/// performs no mutation.
///
/// # Errors
///
/// Returns an error only if the template root does not exist.
pub fn apply(
    ctx: &Context,
    opts: ReconcileOptions,
    tracking: &mut TrackingList,
) -> Result<ApplyReport> {
    ctx.tree.ensure_exists()?;

    let tiers: Vec<String> = ctx.tree.tiers().iter().map(ToString::to_string).collect();
    ctx.log.stage(&format!("Applying {}", tiers.join(" -> ")));

    let walk = ctx.tree.layered(&ctx.home);
    let mut report = ApplyReport {
        problems: walk.problems.len(),
        ..ApplyReport::default()
    };
    for problem in &walk.problems {
        ctx.log
            .warn(&format!("skipping {}: {}", problem.path.display(), problem.error));
    }

    for entry in &walk.entries {
        let shown = ctx.display(&entry.live);
        match apply_entry(ctx, entry, opts, tracking) {
            Ok(change) => {
                report.stats.record(&change);
                let status = match &change {
                    ResourceChange::Skipped { .. } => Outcome::Skipped,
                    ResourceChange::Applied if opts.dry_run => Outcome::DryRun,
                    ResourceChange::Applied | ResourceChange::AlreadyCorrect => Outcome::Ok,
                };
                let detail = match &change {
                    ResourceChange::Skipped { reason } => Some(reason.as_str()),
                    _ => None,
                };
                ctx.log.record(&shown, status, detail);
            }
            Err(e) => {
                ctx.log.error(&format!("{shown}: {e:#}"));
                ctx.log
                    .record(&shown, Outcome::Failed, Some(&format!("{e:#}")));
                report.failures.push(Failure::new(entry.live.clone(), &e));
            }
        }
    }

    ctx.log.info(&report.stats.summary(opts.dry_run));
    Ok(report)
}

fn apply_entry(
    ctx: &Context,
    entry: &TemplateEntry,
    opts: ReconcileOptions,
    tracking: &mut TrackingList,
) -> Result<ResourceChange> {
    if entry.is_dir {
        return mirror_dir(ctx, &entry.template, &entry.live, opts.dry_run);
    }
    reconcile(ctx, &entry.template, &entry.live, opts, tracking)
        .with_context(|| format!("linking {}", ctx.display(&entry.live)))
}

fn mirror_dir(ctx: &Context, template: &Path, live: &Path, dry_run: bool) -> Result<ResourceChange> {
    let resource = DirectoryResource::new(template.to_path_buf(), live.to_path_buf());
    if dry_run {
        if live.symlink_metadata().is_ok() {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        ctx.log
            .dry_run(&format!("would create {}", resource.description()));
        return Ok(ResourceChange::Applied);
    }
    resource
        .apply()
        .with_context(|| format!("creating {}", ctx.display(live)))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::engine::test_helpers::{ENV, Fixture, HOST, backups_of};
    use crate::error::DotpilotError;

    fn opts() -> ReconcileOptions {
        ReconcileOptions::default()
    }

    #[test]
    fn missing_root_is_not_initialized() {
        let fx = Fixture::new();
        std::fs::remove_dir_all(fx.root()).unwrap();
        let err = apply(&fx.ctx(), opts(), &mut TrackingList::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DotpilotError>(),
            Some(DotpilotError::NotInitialized(_))
        ));
    }

    #[test]
    fn links_every_tier_and_mirrors_directories() {
        let fx = Fixture::new();
        let vimrc = fx.template("common/.vimrc", "set nu");
        let nvim = fx.template("common/.config/nvim/init.lua", "-- lua");
        let gitcfg = fx.template(&format!("envs/{ENV}/.work"), "w");
        let mut tracking = TrackingList::default();

        let report = apply(&fx.ctx(), opts(), &mut tracking).unwrap();

        assert!(report.is_clean());
        let home = fx.home();
        assert_eq!(std::fs::read_link(home.join(".vimrc")).unwrap(), vimrc);
        assert_eq!(
            std::fs::read_link(home.join(".config/nvim/init.lua")).unwrap(),
            nvim
        );
        assert_eq!(std::fs::read_link(home.join(".work")).unwrap(), gitcfg);
        assert!(!home.join(".config").symlink_metadata().unwrap().is_symlink());
        assert_eq!(tracking.len(), 3);
    }

    #[test]
    fn machine_tier_wins_over_common() {
        let fx = Fixture::new();
        fx.template("common/.vimrc", "common");
        fx.template(&format!("envs/{ENV}/.vimrc"), "env");
        let machine = fx.template(&format!("machine/{HOST}/.vimrc"), "machine");

        apply(&fx.ctx(), opts(), &mut TrackingList::default()).unwrap();

        let live = fx.home().join(".vimrc");
        assert_eq!(std::fs::read_link(&live).unwrap(), machine);
        assert!(backups_of(&live).is_empty());
    }

    #[test]
    fn second_run_changes_nothing() {
        let fx = Fixture::new();
        fx.template("common/.vimrc", "A");
        fx.template("common/.config/git/config", "[user]");
        fx.live(".vimrc", "B");
        let ctx = fx.ctx();
        let mut tracking = TrackingList::default();

        let first = apply(&ctx, opts(), &mut tracking).unwrap();
        let second = apply(&ctx, opts(), &mut tracking).unwrap();

        assert_eq!(first.stats.changed, 4);
        assert_eq!(second.stats.changed, 0);
        assert_eq!(second.stats.already_ok, 4);
        assert_eq!(backups_of(&fx.home().join(".vimrc")).len(), 1);
    }

    #[test]
    fn reserved_tier_root_entries_are_ignored() {
        let fx = Fixture::new();
        fx.template("common/README.md", "docs");
        fx.template("common/.gitignore", "*.swp");
        fx.template("common/.git/HEAD", "ref");
        fx.template("common/.bashrc", "x");

        apply(&fx.ctx(), opts(), &mut TrackingList::default()).unwrap();

        let home = fx.home();
        assert!(home.join(".bashrc").symlink_metadata().is_ok());
        assert!(home.join("README.md").symlink_metadata().is_err());
        assert!(home.join(".gitignore").symlink_metadata().is_err());
        assert!(home.join(".git").symlink_metadata().is_err());
    }

    #[test]
    fn failing_entry_does_not_stop_the_walk() {
        let fx = Fixture::new();
        fx.template("common/.a/file", "1");
        fx.template("common/.b", "2");
        // A regular file where the directory `.a` should go.
        fx.live(".a", "blocker");

        let report = apply(&fx.ctx(), opts(), &mut TrackingList::default()).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, fx.home().join(".a/file"));
        assert!(fx.home().join(".b").symlink_metadata().unwrap().is_symlink());
        assert_eq!(report.stats.skipped, 1);
    }

    #[test]
    fn dry_run_reports_without_mutation() {
        let fx = Fixture::new();
        fx.template("common/.config/app/rc", "A");
        fx.template("common/.vimrc", "A");
        fx.live(".vimrc", "B");
        let mut tracking = TrackingList::default();

        let report = apply(
            &fx.ctx(),
            ReconcileOptions {
                dry_run: true,
                ..opts()
            },
            &mut tracking,
        )
        .unwrap();

        assert_eq!(report.stats.changed, 4);
        assert!(fx.home().join(".config").symlink_metadata().is_err());
        assert_eq!(
            std::fs::read_to_string(fx.home().join(".vimrc")).unwrap(),
            "B"
        );
        assert!(tracking.is_empty());
    }
}
