//! Timestamped backups taken before destructive overwrites.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::helpers::fs::{copy_dir_recursive, copy_file};
use crate::error::DotpilotError;

/// Marker embedded in live-file backup names.
pub const BACKUP_MARKER: &str = "dotpilot.bak";

/// Current local time formatted as `YYYYMMDDhhmmss`.
#[must_use]
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// Backup path for `path`: `<path>.dotpilot.bak.<ts>`.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use dotpilot_cli::resources::backup::backup_path;
///
/// assert_eq!(
///     backup_path(Path::new("/home/u/.vimrc"), "20240102030405"),
///     PathBuf::from("/home/u/.vimrc.dotpilot.bak.20240102030405"),
/// );
/// ```
#[must_use]
pub fn backup_path(path: &Path, ts: &str) -> PathBuf {
    with_suffix(path, &format!(".{BACKUP_MARKER}.{ts}"))
}

/// Side copy path for a template file: `<dir>/<basename>.local.<ts>`.
#[must_use]
pub fn local_copy_path(template: &Path, ts: &str) -> PathBuf {
    with_suffix(template, &format!(".local.{ts}"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Pick `candidate`, or `candidate.N` for the first free `N`.
///
/// Backups are never overwritten, even when two land in the same second.
fn unused(candidate: PathBuf) -> PathBuf {
    if candidate.symlink_metadata().is_err() {
        return candidate;
    }
    (1u32..)
        .map(|n| with_suffix(&candidate, &format!(".{n}")))
        .find(|p| p.symlink_metadata().is_err())
        .unwrap_or(candidate)
}

/// Copy the content at `path` into a fresh backup.
///
/// Symlinks are followed, so a link's target content is what gets saved.
/// Returns `None` when there is nothing to back up (missing path or broken
/// link).
///
/// # Errors
///
/// Returns an error if the content cannot be copied.
pub fn backup_file(path: &Path) -> Result<Option<PathBuf>> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DotpilotError::io(path, e).into()),
    };
    let dest = unused(backup_path(path, &timestamp()));
    if meta.is_dir() {
        copy_dir_recursive(path, &dest)?;
    } else {
        copy_file(path, &dest)?;
    }
    Ok(Some(dest))
}

/// Copy `live` next to `template` as `<basename>.local.<ts>`.
///
/// # Errors
///
/// Returns an error if the content cannot be copied.
pub fn save_local_copy(live: &Path, template: &Path) -> Result<PathBuf> {
    let dest = unused(local_copy_path(template, &timestamp()));
    copy_file(live, &dest)?;
    Ok(dest)
}
