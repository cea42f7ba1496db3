//! Idempotent filesystem primitives (check + apply pattern).
pub mod backup;
pub mod diff;
pub mod directory;
pub mod helpers;
pub mod symlink;

use std::path::PathBuf;

use anyhow::Result;

/// Minimal interface for resources that can be described and applied.
///
/// Resources with a binding to inspect beforehand implement the richer
/// [`Resource`] super-trait.
pub trait Applicable {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Bring the resource into its desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be made due to I/O failures or
    /// permission issues.
    fn apply(&self) -> Result<ResourceChange>;
}

/// Relationship between a live path and the template entry it should link to.
///
/// # Examples
///
/// ```
/// use dotpilot_cli::resources::LiveBinding;
///
/// assert!(!LiveBinding::Absent.is_conflict());
/// assert!(!LiveBinding::LinkedCorrect.is_conflict());
/// assert!(LiveBinding::Foreign.is_conflict());
/// assert!(LiveBinding::LinkedStale { current: "/elsewhere".into() }.is_conflict());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveBinding {
    /// Nothing exists at the live path.
    Absent,
    /// The live path is a symlink to the expected template entry.
    LinkedCorrect,
    /// The live path is a symlink to some other source.
    LinkedStale {
        /// Where the symlink currently points.
        current: PathBuf,
    },
    /// The live path is a regular file or directory.
    Foreign,
}

impl LiveBinding {
    /// `true` for `Foreign` and `LinkedStale`.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Foreign | Self::LinkedStale { .. })
    }
}

/// Result of applying a resource change.
///
/// # Examples
///
/// ```
/// use dotpilot_cli::resources::ResourceChange;
///
/// let applied = ResourceChange::Applied;
/// let skipped = ResourceChange::Skipped { reason: "declined".into() };
///
/// assert_eq!(applied, ResourceChange::Applied);
/// assert_ne!(applied, ResourceChange::AlreadyCorrect);
/// assert_ne!(skipped, applied);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated.
    Applied,
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
    /// Resource was left alone (declined prompt, protected directory).
    Skipped {
        /// Reason the resource was skipped.
        reason: String,
    },
}

/// A resource whose live binding can be inspected before applying.
pub trait Resource: Applicable {
    /// Inspect the live binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the live path cannot be inspected.
    fn current_state(&self) -> Result<LiveBinding>;

    /// Whether [`Applicable::apply`] would change anything.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool> {
        Ok(!matches!(self.current_state()?, LiveBinding::LinkedCorrect))
    }
}
