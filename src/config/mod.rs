//! Persisted tool state (`~/.dotpilotrc`) and path resolution.
pub mod toml_loader;
pub mod tracking;

pub use tracking::TrackingList;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the state file in the home directory.
pub const CONFIG_FILE: &str = ".dotpilotrc";

/// Directory name of the default template root in the home directory.
pub const DEFAULT_ROOT_DIR: &str = ".dotpilot";

/// Environment variable overriding the template root.
pub const ROOT_ENV: &str = "DOTPILOT_ROOT";

/// Environment used when none has been chosen.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Behaviour switches stored under `[options]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Back up live files before replacing them.
    pub backup_before_overwrite: bool,
    /// Show a diff and ask before replacing a diverged live file.
    pub prompt_on_diff: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            backup_before_overwrite: true,
            prompt_on_diff: true,
        }
    }
}

/// Contents of `~/.dotpilotrc`.
///
/// Loaded once when a command starts and saved once at the end if the
/// tracking list changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote the template repository was cloned from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_repository: Option<String>,
    /// Environment applied by default.
    pub current_environment: String,
    /// Home-relative paths linked into the template tree.
    pub tracking_paths: TrackingList,
    /// Behaviour switches.
    pub options: Options,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_repository: None,
            current_environment: DEFAULT_ENVIRONMENT.to_string(),
            tracking_paths: TrackingList::default(),
            options: Options::default(),
        }
    }
}

impl Config {
    /// Load the state file at `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        toml_loader::load_config(path).context("loading dotpilot config")
    }

    /// Write the state file to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        toml_loader::save_config(path, self)
    }

    /// Current environment, or `None` when unset.
    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        Some(self.current_environment.as_str()).filter(|e| !e.is_empty())
    }

    /// Default location of the state file for `home`.
    #[must_use]
    pub fn default_path(home: &Path) -> PathBuf {
        home.join(CONFIG_FILE)
    }
}

/// The user's home directory.
///
/// # Errors
///
/// Returns an error if neither `HOME` nor (on Windows) `USERPROFILE` is set.
pub fn home_dir() -> Result<PathBuf> {
    let home = if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE")
            .or_else(|_| std::env::var("HOME"))
            .map_err(|_| anyhow::anyhow!("neither USERPROFILE nor HOME environment variable is set"))?
    } else {
        std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?
    };
    Ok(PathBuf::from(home))
}

/// Template root: explicit flag, then `$DOTPILOT_ROOT`, then `~/.dotpilot`.
///
/// A relative root is taken from `cwd`; links into the tree are created
/// from inside home, where a relative target would dangle.
#[must_use]
pub fn resolve_root(flag: Option<&Path>, home: &Path, cwd: &Path) -> PathBuf {
    let root = flag
        .map(Path::to_path_buf)
        .or_else(|| {
            std::env::var_os(ROOT_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| home.join(DEFAULT_ROOT_DIR));
    absolute_from(cwd, &root)
}

/// `path` if absolute, else `path` under `cwd`.
#[must_use]
pub fn absolute_from(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Hostname selecting the machine tier: explicit override, else the OS name.
///
/// # Errors
///
/// Returns an error if no override is given and the OS hostname cannot be
/// read.
pub fn resolve_hostname(flag: Option<&str>) -> Result<String> {
    match flag {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => whoami::fallible::hostname().context("reading hostname"),
    }
}
