//! Tier walker: enumerates template entries below one tier root.
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{Tier, mapper};
use crate::error::DotpilotError;

/// A file or directory inside the template tree, with its live counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    /// Tier the entry belongs to.
    pub tier: Tier,
    /// Absolute path of the entry inside the template tree.
    pub template: PathBuf,
    /// Home-relative path the entry maps to.
    pub relative: PathBuf,
    /// Absolute live path under the home directory.
    pub live: PathBuf,
    /// `true` for directories (mirrored, never symlinked).
    pub is_dir: bool,
}

/// An entry that could not be enumerated or mapped.
#[derive(Debug)]
pub struct WalkProblem {
    /// Path that triggered the problem.
    pub path: PathBuf,
    /// What went wrong.
    pub error: DotpilotError,
}

/// Result of walking one or more tiers.
#[derive(Debug, Default)]
pub struct TierWalk {
    /// Entries in walk order: parents before children, siblings by name.
    pub entries: Vec<TemplateEntry>,
    /// Entries skipped because they were unreadable or malformed.
    pub problems: Vec<WalkProblem>,
}

/// Prefix of tier-root names kept for the repository itself.
const GIT_PREFIX: &str = ".git";

/// Tier-root file describing the tree rather than belonging to home.
const README: &str = "README.md";

/// Return `true` for tier-root entries that are never projected onto home.
///
/// Anything starting with `.git` is reserved, `.gitconfig` included; keep
/// such a file under a subdirectory (e.g. `.config/git/config`) instead.
///
/// ```
/// use dotpilot_cli::template::walk::is_reserved;
///
/// assert!(is_reserved(".git"));
/// assert!(is_reserved(".gitignore"));
/// assert!(is_reserved(".gitconfig"));
/// assert!(is_reserved("README.md"));
/// assert!(!is_reserved(".vimrc"));
/// assert!(!is_reserved("readme.md"));
/// ```
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(GIT_PREFIX) || name == README
}

/// Walk the tier rooted at `root/<tier>` and map each entry onto `home`.
///
/// A missing tier root yields an empty walk.  Symlinks inside the template
/// tree are not followed and are treated as files.
pub fn walk_tier(root: &Path, tier: &Tier, home: &Path) -> TierWalk {
    let tier_root = root.join(tier.relative_root());
    let mut walk = TierWalk::default();
    if !tier_root.is_dir() {
        return walk;
    }

    let entries = WalkDir::new(&tier_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() != 1 || !is_reserved(&e.file_name().to_string_lossy()));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| tier_root.clone(), Path::to_path_buf);
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                walk.problems.push(WalkProblem {
                    error: DotpilotError::io(&path, source),
                    path,
                });
                continue;
            }
        };

        let template = entry.path().to_path_buf();
        let Ok(in_root) = template.strip_prefix(root) else {
            continue;
        };
        match mapper::home_relative(tier, in_root) {
            Ok(relative) => walk.entries.push(TemplateEntry {
                tier: tier.clone(),
                live: home.join(&relative),
                relative,
                is_dir: entry.file_type().is_dir(),
                template,
            }),
            Err(error) => walk.problems.push(WalkProblem {
                path: template,
                error,
            }),
        }
    }
    walk
}
