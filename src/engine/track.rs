//! Tracking Engine: moves live files into the template tree.
use std::path::Path;

use anyhow::{Context as _, Result};
use walkdir::WalkDir;

use super::Context;
use crate::config::TrackingList;
use crate::error::DotpilotError;
use crate::resources::directory::DirectoryResource;
use crate::resources::helpers::fs::copy_file;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable as _, LiveBinding, Resource as _, ResourceChange, backup};

/// Track `source` by copying it to `dest` and linking it back.
///
/// A directory is mirrored into `dest` and each file below it is tracked
/// individually; directories themselves are never linked.  For a file:
///
/// - already a link to `dest`: only registered;
/// - `dest` exists and `overwrite` is false: [`DotpilotError::AlreadyTracked`];
/// - otherwise the bytes and mode are copied to `dest`, the original is
///   backed up, and replaced with a link to `dest`.
///
/// The home-relative form of every linked file is added to `tracking`.
///
/// # Errors
///
/// Returns [`DotpilotError::SourceMissing`] if `source` does not exist,
/// [`DotpilotError::AlreadyTracked`] as above, or an I/O error.  Inside a
/// directory the first failing file aborts the rest.
pub fn track(
    ctx: &Context,
    source: &Path,
    dest: &Path,
    overwrite: bool,
    tracking: &mut TrackingList,
) -> Result<ResourceChange> {
    ctx.tree.ensure_exists()?;
    let meta = std::fs::symlink_metadata(source)
        .map_err(|_| DotpilotError::SourceMissing(source.to_path_buf()))?;

    if meta.is_dir() {
        track_dir(ctx, source, dest, overwrite, tracking)
    } else {
        track_file(ctx, source, dest, overwrite, tracking)
    }
}

fn track_dir(
    ctx: &Context,
    source: &Path,
    dest: &Path,
    overwrite: bool,
    tracking: &mut TrackingList,
) -> Result<ResourceChange> {
    DirectoryResource::new(source.to_path_buf(), dest.to_path_buf()).apply()?;

    // Collected up front: files are replaced by links as the loop runs.
    let entries = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading directory {}", source.display()))?;

    let mut changed = false;
    for entry in entries {
        let rel = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("walking {}", source.display()))?;
        let target = dest.join(rel);
        let change = if entry.file_type().is_dir() {
            DirectoryResource::new(entry.path().to_path_buf(), target).apply()?
        } else {
            track_file(ctx, entry.path(), &target, overwrite, tracking)?
        };
        changed |= change == ResourceChange::Applied;
    }

    Ok(if changed {
        ResourceChange::Applied
    } else {
        ResourceChange::AlreadyCorrect
    })
}

fn track_file(
    ctx: &Context,
    source: &Path,
    dest: &Path,
    overwrite: bool,
    tracking: &mut TrackingList,
) -> Result<ResourceChange> {
    let shown = ctx.display(source);
    let link = SymlinkResource::new(dest.to_path_buf(), source.to_path_buf());

    if link.current_state()? == LiveBinding::LinkedCorrect {
        ctx.log.debug(&format!("already tracked: {shown}"));
        tracking.insert(ctx.home_relative(source));
        return Ok(ResourceChange::AlreadyCorrect);
    }
    if !overwrite && dest.symlink_metadata().is_ok() {
        return Err(DotpilotError::AlreadyTracked(dest.to_path_buf()).into());
    }

    copy_file(source, dest).with_context(|| format!("copying {shown} into the template tree"))?;
    if let Some(saved) = backup::backup_file(source)? {
        ctx.log
            .debug(&format!("backed up {shown} to {}", saved.display()));
    }
    link.apply()?;
    tracking.insert(ctx.home_relative(source));
    ctx.log
        .info(&format!("tracked {shown} -> {}", dest.display()));
    Ok(ResourceChange::Applied)
}
