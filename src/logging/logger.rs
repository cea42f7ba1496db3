//! The [`Logger`]: forwards to [`tracing`] and keeps the run summary.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET, log_file_path};
use super::types::{Log, Outcome, SummaryEntry};

/// Logger used by every command.
///
/// Messages go through the global subscriber installed by
/// [`init_subscriber`](super::init_subscriber); entry outcomes are kept in
/// memory until [`print_summary`](Self::print_summary).
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<SummaryEntry>>,
    log_file: Option<PathBuf>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Logger with an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file: log_file_path(),
        }
    }

    /// Error.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Warning.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Section header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Detail shown only with `--verbose`.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Change a dry run would have made.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record how an entry ended.
    pub fn record(&self, path: &str, outcome: Outcome, detail: Option<&str>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(SummaryEntry {
                path: path.to_string(),
                outcome,
                detail: detail.map(String::from),
            });
        }
    }

    /// Every recorded entry, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<SummaryEntry> {
        self.entries.lock().map_or_else(|_| Vec::new(), |e| e.clone())
    }

    /// Number of failed entries.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries().iter().filter(|e| e.outcome == Outcome::Failed).count()
    }

    /// Summary lines: every entry that did not simply succeed, then totals.
    ///
    /// Empty when nothing was recorded.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let entries = self.entries();
        if entries.is_empty() {
            return Vec::new();
        }
        let count = |outcome| entries.iter().filter(|e| e.outcome == outcome).count();
        let mut lines: Vec<String> = entries
            .iter()
            .filter(|e| e.outcome != Outcome::Ok)
            .map(ToString::to_string)
            .collect();
        lines.push(format!(
            "{} entries: {} ok, {} skipped, {} dry-run, {} failed",
            entries.len(),
            count(Outcome::Ok),
            count(Outcome::Skipped),
            count(Outcome::DryRun),
            count(Outcome::Failed),
        ));
        lines
    }

    /// Print the summary and the log file location.
    pub fn print_summary(&self) {
        let lines = self.summary_lines();
        if lines.is_empty() {
            return;
        }
        self.stage("Summary");
        for line in &lines {
            self.info(line);
        }
        if let Some(path) = &self.log_file {
            self.debug(&format!("log: {}", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        Self::stage(self, msg);
    }

    fn info(&self, msg: &str) {
        Self::info(self, msg);
    }

    fn debug(&self, msg: &str) {
        Self::debug(self, msg);
    }

    fn warn(&self, msg: &str) {
        Self::warn(self, msg);
    }

    fn error(&self, msg: &str) {
        Self::error(self, msg);
    }

    fn dry_run(&self, msg: &str) {
        Self::dry_run(self, msg);
    }

    fn record(&self, path: &str, outcome: Outcome, detail: Option<&str>) {
        Self::record(self, path, outcome, detail);
    }
}
