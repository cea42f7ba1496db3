//! Layered template tree: tiers, path mapping and tier walks.
//!
//! ```text
//! <root>/
//!   common/...
//!   envs/<environment>/...
//!   machine/<hostname>/...
//! ```
pub mod mapper;
pub mod tier;
pub mod walk;

pub use tier::{Tier, TierSkips};
pub use walk::{TemplateEntry, TierWalk, WalkProblem};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::DotpilotError;

/// The template tree rooted at `root`, viewed for one environment and host.
#[derive(Debug, Clone)]
pub struct TemplateTree {
    /// Template root directory.
    pub root: PathBuf,
    /// Active environment, if any.
    pub environment: Option<String>,
    /// Hostname selecting the machine tier.
    pub hostname: String,
    /// Tiers excluded from [`tiers`](Self::tiers).
    pub skip: TierSkips,
}

impl TemplateTree {
    /// Create a view of the tree at `root`.
    #[must_use]
    pub fn new(root: PathBuf, environment: Option<String>, hostname: String) -> Self {
        Self {
            root,
            environment: environment.filter(|e| !e.is_empty()),
            hostname,
            skip: TierSkips::default(),
        }
    }

    /// Leave the tiers marked in `skip` out of apply and scan.
    #[must_use]
    pub const fn with_skips(mut self, skip: TierSkips) -> Self {
        self.skip = skip;
        self
    }

    /// Tiers in application order: common, environment (if set), machine.
    ///
    /// Skipped tiers are left out; the order of the rest is unchanged.
    #[must_use]
    pub fn tiers(&self) -> Vec<Tier> {
        let mut tiers = vec![Tier::Common];
        if let Some(env) = &self.environment {
            tiers.push(Tier::Environment(env.clone()));
        }
        tiers.push(Tier::Machine(self.hostname.clone()));
        tiers.retain(|tier| !self.skip.skips(tier));
        tiers
    }

    /// Absolute root directory of `tier`.
    #[must_use]
    pub fn tier_root(&self, tier: &Tier) -> PathBuf {
        self.root.join(tier.relative_root())
    }

    /// Absolute template path for a home-relative path stored in `tier`.
    #[must_use]
    pub fn template_path(&self, tier: &Tier, home_relative: &Path) -> PathBuf {
        self.root
            .join(mapper::template_relative(tier, home_relative))
    }

    /// Default template destination for tracking `source` into `tier`.
    #[must_use]
    pub fn destination_for(&self, tier: &Tier, home: &Path, source: &Path) -> PathBuf {
        self.template_path(tier, &mapper::relative_to_home(home, source))
    }

    /// Fail with [`DotpilotError::NotInitialized`] when the root is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the template root is not a directory.
    pub fn ensure_exists(&self) -> Result<(), DotpilotError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(DotpilotError::NotInitialized(self.root.clone()))
        }
    }

    /// Walk every tier and collapse overlapping entries by live path.
    ///
    /// For each live path only the highest-precedence tier's entry is kept.
    /// The surviving entry takes the position of the first occurrence so
    /// parents still come before their children.
    #[must_use]
    pub fn layered(&self, home: &Path) -> TierWalk {
        let mut merged = TierWalk::default();
        let mut index: HashMap<PathBuf, usize> = HashMap::new();

        for tier in self.tiers() {
            let walk = walk::walk_tier(&self.root, &tier, home);
            merged.problems.extend(walk.problems);
            for entry in walk.entries {
                if let Some(&slot) = index.get(&entry.live) {
                    if let Some(existing) = merged.entries.get_mut(slot) {
                        *existing = entry;
                    }
                } else {
                    index.insert(entry.live.clone(), merged.entries.len());
                    merged.entries.push(entry);
                }
            }
        }
        merged
    }
}
