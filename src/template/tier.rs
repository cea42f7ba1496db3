//! Precedence tiers of the template tree.
use std::fmt;
use std::path::PathBuf;

/// Directory holding files shared by every machine.
pub const COMMON_DIR: &str = "common";
/// Directory holding one sub-directory per environment.
pub const ENVS_DIR: &str = "envs";
/// Directory holding one sub-directory per hostname.
pub const MACHINE_DIR: &str = "machine";

/// One precedence level of the template tree.
///
/// The derived ordering is the application order: `Common` first,
/// `Machine` last.  A later tier wins when two tiers map to the same live
/// path.
///
/// # Examples
///
/// ```
/// use dotpilot_cli::template::Tier;
///
/// let common = Tier::Common;
/// let env = Tier::Environment("work".into());
/// let machine = Tier::Machine("laptop".into());
///
/// assert!(common < env && env < machine);
/// assert_eq!(machine.relative_root(), std::path::PathBuf::from("machine/laptop"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Shared defaults under `common/`.
    Common,
    /// Environment overrides under `envs/<name>/`.
    Environment(String),
    /// Machine overrides under `machine/<hostname>/`.
    Machine(String),
}

impl Tier {
    /// Storage directory of this tier's kind (`common`, `envs`, `machine`).
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Common => COMMON_DIR,
            Self::Environment(_) => ENVS_DIR,
            Self::Machine(_) => MACHINE_DIR,
        }
    }

    /// Environment name or hostname, if the tier carries one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Common => None,
            Self::Environment(name) | Self::Machine(name) => Some(name),
        }
    }

    /// Number of leading path segments that identify the tier.
    #[must_use]
    pub const fn depth(&self) -> usize {
        match self {
            Self::Common => 1,
            Self::Environment(_) | Self::Machine(_) => 2,
        }
    }

    /// Path of the tier root relative to the template root.
    #[must_use]
    pub fn relative_root(&self) -> PathBuf {
        let mut root = PathBuf::from(self.kind());
        if let Some(name) = self.name() {
            root.push(name);
        }
        root
    }

    /// Pick the tier a newly tracked file is stored in.
    ///
    /// `selector` is `common`, `machine`, or an environment name.  Without a
    /// selector the current environment is used, falling back to `common`
    /// when no environment is configured.
    #[must_use]
    pub fn select(selector: Option<&str>, current_env: Option<&str>, hostname: &str) -> Self {
        match selector {
            Some(COMMON_DIR) => Self::Common,
            Some(MACHINE_DIR) => Self::Machine(hostname.to_string()),
            Some(name) if !name.is_empty() => Self::Environment(name.to_string()),
            _ => current_env
                .filter(|env| !env.is_empty())
                .map_or(Self::Common, |env| Self::Environment(env.to_string())),
        }
    }
}

/// Tiers left out of a run on request.
///
/// ```
/// use dotpilot_cli::template::{Tier, TierSkips};
///
/// let skips = TierSkips { machine: true, ..TierSkips::default() };
/// assert!(skips.skips(&Tier::Machine("laptop".into())));
/// assert!(!skips.skips(&Tier::Common));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierSkips {
    /// Leave out `common/`.
    pub common: bool,
    /// Leave out the active environment.
    pub environment: bool,
    /// Leave out this host's machine tier.
    pub machine: bool,
}

impl TierSkips {
    /// `true` if `tier`'s kind is skipped.
    #[must_use]
    pub const fn skips(&self, tier: &Tier) -> bool {
        match tier {
            Tier::Common => self.common,
            Tier::Environment(_) => self.environment,
            Tier::Machine(_) => self.machine,
        }
    }

    /// `true` if any tier is skipped.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.common || self.environment || self.machine
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "common"),
            Self::Environment(name) => write!(f, "env:{name}"),
            Self::Machine(host) => write!(f, "machine:{host}"),
        }
    }
}
