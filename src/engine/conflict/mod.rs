//! Conflict scanning and resolution.
//!
//! A conflict is a live path that should link into the template tree but
//! holds foreign content or links somewhere else.  [`detect_conflicts`]
//! finds them without touching anything; [`resolve_conflicts`] applies a
//! [`Strategy`] to each one.
mod interactive;
mod resolve;
mod scan;

pub use resolve::{Resolution, ResolveReport, resolve, resolve_conflicts};
pub use scan::detect_conflicts;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::DotpilotError;
use crate::resources::LiveBinding;
use crate::template::Tier;

/// A diverged live path and the template file it should link to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    /// Live path under home.
    pub live: PathBuf,
    /// Template file expected at the live path.
    pub template: PathBuf,
    /// Tier the template file comes from.
    pub tier: Tier,
    /// How the live path diverges (`Foreign` or `LinkedStale`).
    pub binding: LiveBinding,
    /// Positional diff, live content first.
    pub diff: String,
}

/// How to settle a conflict.
///
/// ```
/// use dotpilot_cli::engine::Strategy;
///
/// let s: Strategy = "keep-local".parse().unwrap();
/// assert_eq!(s, Strategy::KeepLocal);
/// assert_eq!(s.to_string(), "keep-local");
/// assert!("bogus".parse::<Strategy>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Ask per conflict.
    Interactive,
    /// Live content replaces the template, then relink.
    KeepLocal,
    /// Back up the live content, then relink to the unchanged template.
    KeepRemote,
    /// Run an external merge tool, store the result in the template, relink.
    Merge,
    /// Save the live content beside the template; touch nothing else.
    BackupBoth,
}

impl Strategy {
    /// Every strategy, in menu order of their names.
    pub const ALL: [Self; 5] = [
        Self::Interactive,
        Self::KeepLocal,
        Self::KeepRemote,
        Self::Merge,
        Self::BackupBoth,
    ];

    /// Name accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::KeepLocal => "keep-local",
            Self::KeepRemote => "keep-remote",
            Self::Merge => "merge",
            Self::BackupBoth => "backup-both",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = DotpilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| DotpilotError::UnknownStrategy(s.to_string()))
    }
}
