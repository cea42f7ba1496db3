//! Symlink resource: binds a live path to a template entry.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::helpers::fs::{ensure_parent_dir, is_real_dir, remove_existing, same_file};
use super::{Applicable, LiveBinding, Resource, ResourceChange};
use crate::error::DotpilotError;

/// A symlink `target -> source` that can be checked and applied.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The template entry (what the symlink points to).
    pub source: PathBuf,
    /// The live path (where the symlink is created).
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }

    /// `true` if the live path is a real directory that must not be replaced.
    #[must_use]
    pub fn target_is_real_dir(&self) -> bool {
        is_real_dir(&self.target)
    }
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.target)?;
        remove_existing(&self.target)?;
        create_symlink(&self.source, &self.target)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<LiveBinding> {
        let meta = match std::fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LiveBinding::Absent),
            Err(e) => return Err(DotpilotError::io(&self.target, e).into()),
        };
        if !meta.is_symlink() {
            return Ok(LiveBinding::Foreign);
        }

        let existing = std::fs::read_link(&self.target)
            .with_context(|| format!("reading link: {}", self.target.display()))?;
        let resolved = self
            .target
            .parent()
            .map_or_else(|| existing.clone(), |dir| dir.join(&existing));
        // `..` in a relative link only resolves against the real filesystem.
        if paths_equal(&resolved, &self.source) || same_file(&self.target, &self.source) {
            Ok(LiveBinding::LinkedCorrect)
        } else {
            Ok(LiveBinding::LinkedStale { current: existing })
        }
    }
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.components().collect()
    };

    normalize(a) == normalize(b)
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);

    #[cfg(windows)]
    let result = if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    };

    result.with_context(|| {
        format!(
            "creating symlink {} -> {}",
            link.display(),
            target.display()
        )
    })
}
