//! Summary records and the [`Log`] capability.
use std::fmt;

/// How one entry of a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Changed, or already in the desired state.
    Ok,
    /// Deliberately left alone (declined prompt, skipped conflict).
    Skipped,
    /// Dry run; the change was only reported.
    DryRun,
    /// Failed; the batch continued with the next entry.
    Failed,
}

impl Outcome {
    /// Single-character marker used in the summary.
    #[must_use]
    pub const fn mark(self) -> char {
        match self {
            Self::Ok => '✓',
            Self::Skipped => '○',
            Self::DryRun => '~',
            Self::Failed => '✗',
        }
    }
}

/// One processed entry, as listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    /// What was processed, usually a `~/`-relative live path.
    pub path: String,
    /// How it ended.
    pub outcome: Outcome,
    /// Skip reason or error chain.
    pub detail: Option<String>,
}

impl fmt::Display for SummaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.outcome.mark(), self.path)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Logging capability handed to the engine.
///
/// Engine code logs through this trait so tests can substitute their own
/// implementation for the real [`Logger`](super::Logger).
pub trait Log: Send + Sync {
    /// Section header.
    fn stage(&self, msg: &str);
    /// Informational message.
    fn info(&self, msg: &str);
    /// Detail shown only with `--verbose` (always written to the log file).
    fn debug(&self, msg: &str);
    /// Warning.
    fn warn(&self, msg: &str);
    /// Error.
    fn error(&self, msg: &str);
    /// Change that a dry run would have made.
    fn dry_run(&self, msg: &str);
    /// Record how an entry ended, for the summary.
    fn record(&self, path: &str, outcome: Outcome, detail: Option<&str>);
}
