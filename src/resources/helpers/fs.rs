//! Filesystem helpers shared by the resources and the engine.
//!
//! None of these follow a symlink at the path they are given, except where
//! noted; the live tree is full of links into the template tree and
//! following one would touch the template instead.
use std::path::Path;

use anyhow::{Context as _, Result};
use walkdir::WalkDir;

/// Create every missing ancestor of `path`.
///
/// # Errors
///
/// Returns an error if a directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display())),
        _ => Ok(()),
    }
}

/// Delete the file, link, or directory tree at `path`; absent is fine.
///
/// A symlink is unlinked, never its target.
///
/// # Errors
///
/// Returns an error if `path` exists and cannot be deleted.
pub fn remove_existing(path: &Path) -> Result<()> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    let removed = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.with_context(|| format!("removing {}", path.display()))
}

/// `true` only for a directory that is not reached through a symlink.
#[must_use]
pub fn is_real_dir(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|meta| meta.file_type().is_dir())
}

/// `true` if both paths exist and resolve to the same entry.
///
/// Links are followed on both sides, so `~/.vimrc -> ../dots/common/.vimrc`
/// and `dots/common/.vimrc` are the same file.
#[must_use]
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy `src` to `dst` with its mode bits, creating `dst`'s parents.
///
/// `src` is followed if it is a link, so the copy holds real content.
///
/// # Errors
///
/// Returns an error if a parent cannot be created, if `src` and `dst` are
/// the same file, or if the copy fails.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if same_file(src, dst) {
        anyhow::bail!(
            "refusing to copy {} onto itself via {}",
            dst.display(),
            src.display()
        );
    }
    ensure_parent_dir(dst)?;
    std::fs::copy(src, dst)
        .map(drop)
        .with_context(|| format!("copying {} to {}", src.display(), dst.display()))
}

/// Copy the tree under `src` to `dst`, materialising links it contains.
///
/// # Errors
///
/// Returns an error if an entry cannot be read or written.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("walking {}", src.display()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("creating {}", target.display()))?;
            copy_permissions(entry.path(), &target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Give `dst` the permission bits of `src`.
///
/// # Errors
///
/// Returns an error if `src` cannot be read or `dst` cannot be changed.
pub fn copy_permissions(src: &Path, dst: &Path) -> Result<()> {
    let meta = std::fs::metadata(src).with_context(|| format!("reading {}", src.display()))?;
    std::fs::set_permissions(dst, meta.permissions())
        .with_context(|| format!("setting permissions on {}", dst.display()))
}
