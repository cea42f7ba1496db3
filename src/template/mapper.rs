//! Pure mapping between template-tree paths and live (home) paths.
use std::path::{Component, Path, PathBuf};

use super::Tier;
use crate::error::DotpilotError;

/// Map a template-root-relative path to its home-relative counterpart.
///
/// Strips the tier's root segments: one for `common`, two for `envs/<name>`
/// and `machine/<hostname>`.
///
/// # Errors
///
/// Returns [`DotpilotError::Mapping`] if `relative` does not start with the
/// tier's root or has nothing left after stripping it.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use dotpilot_cli::template::{Tier, mapper};
///
/// let live = mapper::home_relative(&Tier::Environment("dev".into()), Path::new("envs/dev/.config/git/config")).unwrap();
/// assert_eq!(live, PathBuf::from(".config/git/config"));
///
/// assert!(mapper::home_relative(&Tier::Common, Path::new("common")).is_err());
/// ```
pub fn home_relative(tier: &Tier, relative: &Path) -> Result<PathBuf, DotpilotError> {
    let malformed = |reason: &str| DotpilotError::Mapping {
        path: relative.to_path_buf(),
        reason: reason.to_string(),
    };

    let root = tier.relative_root();
    let rest = relative
        .strip_prefix(&root)
        .map_err(|_| malformed(&format!("not under tier root {}", root.display())))?;

    if rest.components().next().is_none() {
        return Err(malformed("path has no entry below the tier root"));
    }
    if rest
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(malformed("path must not contain '..' or root segments"));
    }
    Ok(rest.to_path_buf())
}

/// Map a template-root-relative path to its absolute live path under `home`.
///
/// # Errors
///
/// Returns [`DotpilotError::Mapping`] under the same conditions as
/// [`home_relative`].
pub fn live_path(home: &Path, tier: &Tier, relative: &Path) -> Result<PathBuf, DotpilotError> {
    Ok(home.join(home_relative(tier, relative)?))
}

/// Map a home-relative path to its template-root-relative path in `tier`.
#[must_use]
pub fn template_relative(tier: &Tier, home_relative: &Path) -> PathBuf {
    tier.relative_root().join(home_relative)
}

/// Express `path` relative to `home` when it lives under it.
///
/// Paths outside `home` lose their root so they can still be stored below
/// a tier root (`/etc/hosts` becomes `etc/hosts`).
#[must_use]
pub fn relative_to_home(home: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(home).map_or_else(
        |_| {
            path.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect()
        },
        Path::to_path_buf,
    )
}
