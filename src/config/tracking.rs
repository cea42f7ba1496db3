//! Ordered, de-duplicated list of tracked home-relative paths.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Append-only set of tracked paths, in first-insertion order.
///
/// ```
/// use std::path::Path;
/// use dotpilot_cli::config::TrackingList;
///
/// let mut list = TrackingList::default();
/// assert!(list.insert(Path::new(".vimrc")));
/// assert!(!list.insert(Path::new(".vimrc")));
/// assert_eq!(list.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PathBuf>", into = "Vec<PathBuf>")]
pub struct TrackingList {
    paths: Vec<PathBuf>,
    dirty: bool,
}

impl TrackingList {
    /// Add `path` unless an identical path is already present.
    ///
    /// Returns `true` if the list changed.
    pub fn insert(&mut self, path: &Path) -> bool {
        if self.contains(path) {
            return false;
        }
        self.paths.push(path.to_path_buf());
        self.dirty = true;
        true
    }

    /// Whether `path` is tracked (exact equality).
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Tracked paths in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Number of tracked paths.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.paths.len()
    }

    /// `true` when nothing is tracked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// `true` if paths were added since load.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl From<Vec<PathBuf>> for TrackingList {
    fn from(paths: Vec<PathBuf>) -> Self {
        let mut list = Self::default();
        for p in &paths {
            list.insert(p);
        }
        list.dirty = false;
        list
    }
}

impl From<TrackingList> for Vec<PathBuf> {
    fn from(list: TrackingList) -> Self {
        list.paths
    }
}
