//! Reconciliation engine: layered apply, tracking, conflict scan and resolve.
//!
//! Every operation takes a [`Context`] carrying the template tree, the home
//! directory and the injected capabilities (logging, prompting, external
//! tools).  State that must persist, the [`TrackingList`](crate::config::TrackingList),
//! is passed by reference and saved by the caller.
pub mod apply;
pub mod conflict;
mod context;
pub mod reconcile;
pub mod track;

pub use apply::{ApplyReport, apply};
pub use conflict::{ConflictRecord, ResolveReport, Strategy, detect_conflicts, resolve_conflicts};
pub use context::Context;
pub use reconcile::{ReconcileOptions, reconcile};
pub use track::track;

use std::path::PathBuf;

use crate::resources::ResourceChange;

/// Counters for a batch of reconciled entries.
///
/// ```
/// use dotpilot_cli::engine::BatchStats;
///
/// let stats = BatchStats { changed: 3, already_ok: 10, skipped: 0 };
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
///
/// let stats = BatchStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Entries changed (or that would change in a dry run).
    pub changed: u32,
    /// Entries already in the desired state.
    pub already_ok: u32,
    /// Entries deliberately left alone.
    pub skipped: u32,
}

impl BatchStats {
    /// Count one entry outcome.
    pub const fn record(&mut self, change: &ResourceChange) {
        match change {
            ResourceChange::Applied => self.changed += 1,
            ResourceChange::AlreadyCorrect => self.already_ok += 1,
            ResourceChange::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }
}

/// A batch item that failed; the batch continued past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Path the failure is associated with.
    pub path: PathBuf,
    /// Rendered error chain.
    pub message: String,
}

impl Failure {
    /// Capture `err` (with its context chain) for `path`.
    #[must_use]
    pub fn new(path: PathBuf, err: &anyhow::Error) -> Self {
        Self {
            path,
            message: format!("{err:#}"),
        }
    }
}

/// Shared fixtures for engine unit tests.
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub mod test_helpers {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use super::Context;
    use crate::exec::test_helpers::FakeExecutor;
    use crate::logging::Logger;
    use crate::prompt::test_helpers::{Answer, ScriptedPrompt};
    use crate::resources::backup::BACKUP_MARKER;
    use crate::template::TemplateTree;

    /// Hostname used for the machine tier in fixtures.
    pub const HOST: &str = "box";
    /// Environment used for the environment tier in fixtures.
    pub const ENV: &str = "work";

    /// Temporary home directory and template root with fake capabilities.
    pub struct Fixture {
        dir: tempfile::TempDir,
        /// Logger shared with every context built from this fixture.
        pub log: Arc<Logger>,
        /// Prompt shared with every context built from this fixture.
        pub prompt: Arc<ScriptedPrompt>,
        /// Executor shared with every context built from this fixture.
        pub executor: Arc<FakeExecutor>,
        editor: Option<String>,
    }

    impl Fixture {
        /// Empty home and template root; no answers queued, no tools.
        #[must_use]
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("home")).unwrap();
            std::fs::create_dir_all(dir.path().join("root")).unwrap();
            Self {
                dir,
                log: Arc::new(Logger::new()),
                prompt: Arc::new(ScriptedPrompt::default()),
                executor: Arc::new(FakeExecutor::empty()),
                editor: None,
            }
        }

        /// Replace the prompt with one replaying `answers`.
        #[must_use]
        pub fn with_answers(mut self, answers: impl IntoIterator<Item = Answer>) -> Self {
            self.prompt = Arc::new(ScriptedPrompt::new(answers));
            self
        }

        /// Replace the executor.
        #[must_use]
        pub fn with_executor(mut self, executor: FakeExecutor) -> Self {
            self.executor = Arc::new(executor);
            self
        }

        /// Configure an editor command line.
        #[must_use]
        pub fn with_editor(mut self, editor: &str) -> Self {
            self.editor = Some(editor.to_string());
            self
        }

        /// Home directory.
        #[must_use]
        pub fn home(&self) -> PathBuf {
            self.dir.path().join("home")
        }

        /// Template root.
        #[must_use]
        pub fn root(&self) -> PathBuf {
            self.dir.path().join("root")
        }

        /// Write a template file at `rel` (relative to the root).
        pub fn template(&self, rel: &str, content: &str) -> PathBuf {
            write(&self.root().join(rel), content)
        }

        /// Write a live file at `rel` (relative to home).
        pub fn live(&self, rel: &str, content: &str) -> PathBuf {
            write(&self.home().join(rel), content)
        }

        /// Context over the fixture for environment [`ENV`] and host [`HOST`].
        #[must_use]
        pub fn ctx(&self) -> Context {
            let tree = TemplateTree::new(self.root(), Some(ENV.to_string()), HOST.to_string());
            Context::new(
                self.home(),
                tree,
                self.log.clone(),
                self.prompt.clone(),
                self.executor.clone(),
            )
            .with_editor(self.editor.clone())
        }
    }

    fn write(path: &Path, content: &str) -> PathBuf {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
        path.to_path_buf()
    }

    /// Backups created next to `path`, sorted by name.
    #[must_use]
    pub fn backups_of(path: &Path) -> Vec<PathBuf> {
        let prefix = format!(
            "{}.{BACKUP_MARKER}.",
            path.file_name().unwrap().to_string_lossy()
        );
        let Ok(read) = std::fs::read_dir(path.parent().unwrap()) else {
            return vec![];
        };
        let mut found: Vec<PathBuf> = read
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path())
            .collect();
        found.sort();
        found
    }
}
