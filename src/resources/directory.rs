//! Directory resource: mirrors a template directory at its live path.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::helpers::fs::{copy_permissions, is_real_dir};
use super::{Applicable, ResourceChange};

/// A live directory mirroring a template directory's permission bits.
#[derive(Debug, Clone)]
pub struct DirectoryResource {
    /// Template directory providing the permission bits.
    pub source: PathBuf,
    /// Live directory to create.
    pub target: PathBuf,
}

impl DirectoryResource {
    /// Create a new directory resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }
}

impl Applicable for DirectoryResource {
    fn description(&self) -> String {
        format!("{}/", self.target.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        if is_real_dir(&self.target) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        if self.target.symlink_metadata().is_ok() {
            return Ok(ResourceChange::Skipped {
                reason: "live path exists and is not a directory".to_string(),
            });
        }
        std::fs::create_dir_all(&self.target)
            .with_context(|| format!("creating directory {}", self.target.display()))?;
        copy_permissions(&self.source, &self.target)?;
        Ok(ResourceChange::Applied)
    }
}
