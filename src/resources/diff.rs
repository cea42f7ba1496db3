//! Positional line diff used for conflict display.
//!
//! Lines are compared by index, not aligned: an inserted line shows up as
//! every following line changing.  The output format is stable and relied
//! upon by prompts and reports.
use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use crate::error::DotpilotError;

/// Text returned when both inputs have the same lines.
pub const IDENTICAL: &str = "Files are identical";

/// Text shown when a diff cannot be computed.
pub const UNAVAILABLE: &str = "Unable to generate diff";

/// Compare `old` and `new` line by line.
///
/// ```
/// use dotpilot_cli::resources::diff::diff_text;
///
/// assert_eq!(diff_text("a\nb", "a\nc"), "- b\n+ c\n");
/// assert_eq!(diff_text("a", "a"), "Files are identical");
/// ```
#[must_use]
pub fn diff_text(old: &str, new: &str) -> String {
    let old: Vec<&str> = old.split('\n').collect();
    let new: Vec<&str> = new.split('\n').collect();
    let mut out = String::new();

    for i in 0..old.len().max(new.len()) {
        match (old.get(i), new.get(i)) {
            (None, Some(n)) => {
                let _ = writeln!(out, "+ {n}");
            }
            (Some(o), None) => {
                let _ = writeln!(out, "- {o}");
            }
            (Some(o), Some(n)) if o != n => {
                let _ = writeln!(out, "- {o}\n+ {n}");
            }
            _ => {}
        }
    }

    if out.is_empty() {
        IDENTICAL.to_string()
    } else {
        out
    }
}

/// Diff the contents of two files (`old` first).
///
/// # Errors
///
/// Returns an error if either file cannot be read.
pub fn file_diff(old: &Path, new: &Path) -> Result<String> {
    let read = |p: &Path| {
        std::fs::read(p)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .map_err(|e| DotpilotError::io(p, e))
    };
    Ok(diff_text(&read(old)?, &read(new)?))
}

/// Like [`file_diff`], degrading to [`UNAVAILABLE`] on failure.
#[must_use]
pub fn file_diff_lossy(old: &Path, new: &Path) -> String {
    file_diff(old, new).unwrap_or_else(|_| UNAVAILABLE.to_string())
}
