//! Conflict Resolver.
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{ConflictRecord, Strategy, detect_conflicts, interactive};
use crate::engine::{Context, Failure};
use crate::error::DotpilotError;
use crate::exec::{MERGE_TOOLS, locate};
use crate::logging::Outcome;
use crate::resources::helpers::fs::{copy_file, same_file};
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable as _, backup};

/// What resolving one conflict did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Live content copied into the template; live path relinked.
    KeptLocal,
    /// Live content backed up; live path relinked to the template.
    KeptRemote {
        /// Backup of the previous live content, if there was any.
        backup: Option<PathBuf>,
    },
    /// Merge result stored in the template; live path relinked.
    Merged {
        /// Merge tool that produced the result.
        tool: String,
    },
    /// Live content saved beside the template; nothing else changed.
    SavedCopy(PathBuf),
    /// Live path already reached the template file; only the link was rewritten.
    Relinked,
    /// Left as is.
    Skipped,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeptLocal => f.write_str("kept local version"),
            Self::KeptRemote { backup: Some(path) } => {
                write!(f, "kept remote version, backup at {}", path.display())
            }
            Self::KeptRemote { backup: None } => f.write_str("kept remote version"),
            Self::Merged { tool } => write!(f, "merged with {tool}"),
            Self::SavedCopy(path) => write!(f, "saved local copy to {}", path.display()),
            Self::Relinked => f.write_str("relinked to the template"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Outcome of [`resolve_conflicts`].
#[derive(Debug, Default)]
pub struct ResolveReport {
    /// Number of conflicts detected.
    pub conflicts: usize,
    /// Live path and outcome of each conflict that was handled.
    pub outcomes: Vec<(PathBuf, Resolution)>,
    /// Conflicts whose resolution failed; later ones were still processed.
    pub failures: Vec<Failure>,
}

impl ResolveReport {
    /// `true` when no resolution failed.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply `strategy` to a single conflict.
///
/// # Errors
///
/// Returns [`DotpilotError::NoMergeTool`] for a merge with no tool
/// installed, or any filesystem or process error.  On error the live path
/// and template are left as they were, except that a relink failure can
/// follow an already updated template.
pub fn resolve(ctx: &Context, record: &ConflictRecord, strategy: Strategy) -> Result<Resolution> {
    match strategy {
        Strategy::Interactive => interactive::resolve_interactive(ctx, record),
        Strategy::KeepLocal => keep_local(ctx, record),
        Strategy::KeepRemote => keep_remote(ctx, record),
        Strategy::Merge => merge(ctx, record),
        Strategy::BackupBoth => backup_both(ctx, record),
    }
}

/// Detect conflicts and resolve each with the strategy named `strategy`.
///
/// The name is checked before anything is scanned or changed.  A failing
/// conflict is logged and recorded in the report; the rest still run.
///
/// # Errors
///
/// Returns [`DotpilotError::UnknownStrategy`] for an unrecognised name, or
/// an error if the template root does not exist.
pub fn resolve_conflicts(ctx: &Context, strategy: &str) -> Result<ResolveReport> {
    let strategy: Strategy = strategy.parse()?;
    let conflicts = detect_conflicts(ctx)?;
    let mut report = ResolveReport {
        conflicts: conflicts.len(),
        ..ResolveReport::default()
    };
    if conflicts.is_empty() {
        ctx.log.info("No conflicts detected");
        return Ok(report);
    }
    ctx.log.stage(&format!("Detected {} conflicts", conflicts.len()));

    for record in &conflicts {
        let shown = ctx.display(&record.live);
        match resolve(ctx, record, strategy) {
            Ok(resolution) => {
                ctx.log.info(&format!("{shown}: {resolution}"));
                let status = if resolution == Resolution::Skipped {
                    Outcome::Skipped
                } else {
                    Outcome::Ok
                };
                ctx.log
                    .record(&shown, status, Some(&resolution.to_string()));
                report.outcomes.push((record.live.clone(), resolution));
            }
            Err(e) => {
                ctx.log
                    .error(&format!("failed to resolve conflict for {shown}: {e:#}"));
                ctx.log
                    .record(&shown, Outcome::Failed, Some(&format!("{e:#}")));
                report.failures.push(Failure::new(record.live.clone(), &e));
            }
        }
    }
    Ok(report)
}

pub(super) fn keep_local(ctx: &Context, record: &ConflictRecord) -> Result<Resolution> {
    if same_file(&record.live, &record.template) {
        relink(record)?;
        return Ok(Resolution::Relinked);
    }
    copy_file(&record.live, &record.template).with_context(|| {
        format!(
            "copying {} over {}",
            ctx.display(&record.live),
            record.template.display()
        )
    })?;
    relink(record)?;
    Ok(Resolution::KeptLocal)
}

pub(super) fn keep_remote(ctx: &Context, record: &ConflictRecord) -> Result<Resolution> {
    let saved = backup::backup_file(&record.live)
        .with_context(|| format!("backing up {}", ctx.display(&record.live)))?;
    relink(record)?;
    Ok(Resolution::KeptRemote { backup: saved })
}

pub(super) fn merge(ctx: &Context, record: &ConflictRecord) -> Result<Resolution> {
    if same_file(&record.live, &record.template) {
        relink(record)?;
        return Ok(Resolution::Relinked);
    }
    let tool = locate(ctx.executor.as_ref(), MERGE_TOOLS).ok_or_else(|| {
        DotpilotError::NoMergeTool {
            tried: MERGE_TOOLS.join(", "),
        }
    })?;

    // Removed on drop, whichever way this function returns.
    let merged = tempfile::Builder::new()
        .prefix("dotpilot-merge-")
        .tempfile()
        .context("creating merge file")?;
    std::fs::copy(&record.template, merged.path())
        .map_err(|e| DotpilotError::io(&record.template, e))?;

    ctx.log
        .info(&format!("opening {} in {tool}", ctx.display(&record.live)));
    let files = [record.live.as_path(), merged.path(), record.template.as_path()];
    if !tool.run(ctx.executor.as_ref(), &files)? {
        anyhow::bail!("{tool} exited with an error; template left unchanged");
    }

    write_content(merged.path(), &record.template)?;
    relink(record)?;
    Ok(Resolution::Merged {
        tool: tool.to_string(),
    })
}

pub(super) fn backup_both(ctx: &Context, record: &ConflictRecord) -> Result<Resolution> {
    let saved = backup::save_local_copy(&record.live, &record.template)
        .with_context(|| format!("saving a copy of {}", ctx.display(&record.live)))?;
    Ok(Resolution::SavedCopy(saved))
}

/// Point the live path at the template.
pub(super) fn relink(record: &ConflictRecord) -> Result<()> {
    SymlinkResource::new(record.template.clone(), record.live.clone())
        .apply()
        .with_context(|| format!("relinking {}", record.live.display()))?;
    Ok(())
}

/// Overwrite `dest`'s content with `src`'s, keeping `dest`'s mode.
pub(super) fn write_content(src: &Path, dest: &Path) -> Result<()> {
    let bytes = std::fs::read(src).map_err(|e| DotpilotError::io(src, e))?;
    std::fs::write(dest, bytes).map_err(|e| DotpilotError::io(dest, e))?;
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::engine::test_helpers::{Fixture, backups_of};
    use crate::exec::test_helpers::FakeExecutor;

    fn single(fx: &Fixture) -> ConflictRecord {
        let mut conflicts = detect_conflicts(&fx.ctx()).unwrap();
        assert_eq!(conflicts.len(), 1);
        conflicts.remove(0)
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn keep_local_moves_live_bytes_into_template() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let record = single(&fx);

        let res = resolve(&fx.ctx(), &record, Strategy::KeepLocal).unwrap();

        assert_eq!(res, Resolution::KeptLocal);
        assert_eq!(read(&tpl), "B");
        assert_eq!(read(&live), "B");
        assert_eq!(std::fs::read_link(&live).unwrap(), tpl);
    }

    #[cfg(unix)]
    #[test]
    fn keep_local_on_a_link_into_the_template_only_relinks() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "precious");
        let live = fx.home().join(".vimrc");
        let via_parent = Path::new("..")
            .join(fx.root().file_name().unwrap())
            .join("common/.vimrc");
        std::os::unix::fs::symlink(&via_parent, &live).unwrap();
        let record = ConflictRecord {
            live: live.clone(),
            template: tpl.clone(),
            tier: crate::template::Tier::Common,
            binding: crate::resources::LiveBinding::LinkedStale {
                current: via_parent,
            },
            diff: String::new(),
        };

        for strategy in [Strategy::KeepLocal, Strategy::Merge] {
            let res = resolve(&fx.ctx(), &record, strategy).unwrap();
            assert_eq!(res, Resolution::Relinked);
            assert_eq!(read(&tpl), "precious");
            assert_eq!(std::fs::read_link(&live).unwrap(), tpl);
        }
        assert!(fx.executor.calls().is_empty());
    }

    #[test]
    fn keep_remote_backs_up_once_and_keeps_template() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let record = single(&fx);

        let res = resolve(&fx.ctx(), &record, Strategy::KeepRemote).unwrap();

        let backups = backups_of(&live);
        assert_eq!(backups.len(), 1);
        assert_eq!(
            res,
            Resolution::KeptRemote {
                backup: Some(backups[0].clone())
            }
        );
        assert_eq!(read(&backups[0]), "B");
        assert_eq!(read(&tpl), "A");
        assert_eq!(read(&live), "A");
    }

    #[test]
    fn backup_both_touches_neither_side() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let record = single(&fx);

        let res = resolve(&fx.ctx(), &record, Strategy::BackupBoth).unwrap();

        let Resolution::SavedCopy(copy) = res else {
            panic!("expected a saved copy, got {res:?}");
        };
        assert_eq!(copy.parent(), tpl.parent());
        assert!(
            copy.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(".vimrc.local.")
        );
        assert_eq!(read(&copy), "B");
        assert_eq!(read(&tpl), "A");
        assert_eq!(read(&live), "B");
        assert!(!live.symlink_metadata().unwrap().is_symlink());
    }

    #[test]
    fn merge_without_tool_fails_typed() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        fx.live(".vimrc", "B");
        let record = single(&fx);

        let err = resolve(&fx.ctx(), &record, Strategy::Merge).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DotpilotError>(),
            Some(DotpilotError::NoMergeTool { tried }) if tried == "meld, kdiff3, vimdiff, code -d"
        ));
        assert_eq!(read(&tpl), "A");
    }

    #[test]
    fn merge_stores_tool_output_and_relinks() {
        let executor = FakeExecutor::with(&["kdiff3"]).on_run(|_, args| {
            std::fs::write(&args[1], "merged")?;
            Ok(true)
        });
        let fx = Fixture::new().with_executor(executor);
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let record = single(&fx);

        let res = resolve(&fx.ctx(), &record, Strategy::Merge).unwrap();

        assert_eq!(
            res,
            Resolution::Merged {
                tool: "kdiff3".into()
            }
        );
        assert_eq!(read(&tpl), "merged");
        assert_eq!(std::fs::read_link(&live).unwrap(), tpl);

        let calls = fx.executor.calls();
        assert_eq!(calls.len(), 1);
        let (program, args) = &calls[0];
        assert_eq!(program, "kdiff3");
        assert_eq!(args[0], live.as_os_str());
        assert_eq!(args[2], tpl.as_os_str());
        let temp = PathBuf::from(&args[1]);
        assert!(
            temp.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("dotpilot-merge-")
        );
        assert!(!temp.exists());
    }

    #[test]
    fn failed_merge_leaves_both_sides() {
        let executor = FakeExecutor::with(&["meld"]).on_run(|_, _| Ok(false));
        let fx = Fixture::new().with_executor(executor);
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");
        let record = single(&fx);

        assert!(resolve(&fx.ctx(), &record, Strategy::Merge).is_err());
        assert_eq!(read(&tpl), "A");
        assert_eq!(read(&live), "B");
    }

    #[test]
    fn unknown_strategy_mutates_nothing() {
        let fx = Fixture::new();
        let tpl = fx.template("common/.vimrc", "A");
        let live = fx.live(".vimrc", "B");

        let err = resolve_conflicts(&fx.ctx(), "bogus").unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DotpilotError>(),
            Some(DotpilotError::UnknownStrategy(s)) if s == "bogus"
        ));
        assert_eq!(read(&tpl), "A");
        assert_eq!(read(&live), "B");
        assert!(backups_of(&live).is_empty());
    }

    #[test]
    fn no_conflicts_is_an_empty_report() {
        let fx = Fixture::new();
        fx.template("common/.vimrc", "A");
        let report = resolve_conflicts(&fx.ctx(), "keep-local").unwrap();
        assert_eq!(report.conflicts, 0);
        assert!(report.outcomes.is_empty());
        assert!(report.is_clean());
    }

    #[cfg(unix)]
    #[test]
    fn batch_continues_past_failures() {
        let fx = Fixture::new();
        fx.template("common/.a", "A");
        let b_tpl = fx.template("common/.b", "B");
        // Dangling link: keep-local has nothing to copy.
        std::os::unix::fs::symlink(fx.home().join("gone"), fx.home().join(".a")).unwrap();
        let b_live = fx.live(".b", "local b");

        let report = resolve_conflicts(&fx.ctx(), "keep-local").unwrap();

        assert_eq!(report.conflicts, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, fx.home().join(".a"));
        assert_eq!(report.outcomes, vec![(b_live, Resolution::KeptLocal)]);
        assert_eq!(read(&b_tpl), "local b");
    }
}
