//! Domain-specific error types for the reconciliation engine.
//!
//! Engine functions return [`anyhow::Result`] and raise these typed errors
//! at the point of failure, so callers can tell them apart with
//! [`anyhow::Error::downcast_ref`] while still getting path context.
//!
//! # Error taxonomy
//!
//! ```text
//! DotpilotError
//! ├── Io              filesystem failure on a specific path (entry aborted)
//! ├── Mapping         template path too short to map (entry skipped)
//! ├── AlreadyTracked  destination exists and overwrite was not requested
//! ├── SourceMissing   nothing to track at the given path
//! ├── UnknownStrategy unrecognised resolution strategy name
//! ├── NoMergeTool     no external merge tool on PATH
//! └── NotInitialized  template root does not exist
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the reconciliation engine.
#[derive(Error, Debug)]
pub enum DotpilotError {
    /// A filesystem operation failed for a specific path.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A template-relative path could not be mapped to a live path.
    #[error("cannot map {path}: {reason}")]
    Mapping {
        /// Template-relative path that failed to map.
        path: PathBuf,
        /// Why the mapping failed.
        reason: String,
    },

    /// The template destination already exists and overwrite was not requested.
    #[error("destination already exists: {0}")]
    AlreadyTracked(PathBuf),

    /// The path to track does not exist.
    #[error("file or directory does not exist: {0}")]
    SourceMissing(PathBuf),

    /// A resolution strategy name was not recognised.
    #[error(
        "unknown conflict resolution strategy '{0}': expected one of interactive, keep-local, keep-remote, merge, backup-both"
    )]
    UnknownStrategy(String),

    /// None of the supported merge tools is installed.
    #[error("no merge tool found, please install one of: {tried}")]
    NoMergeTool {
        /// Comma-separated list of tools that were looked up.
        tried: String,
    },

    /// The template root does not exist yet.
    #[error("template root {0} does not exist; run 'dotpilot init' first")]
    NotInitialized(PathBuf),
}

impl DotpilotError {
    /// Wrap an [`std::io::Error`] with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
