//! Layered dotfiles manager.
//!
//! One template tree holds every dotfile, split into tiers: `common/` applies
//! everywhere, `envs/<name>/` to one environment, and `machine/<hostname>/`
//! to one machine.  Applying the tree links each file into the home
//! directory, with later tiers overriding earlier ones.
//!
//! The public API is organised into layers:
//!
//! - **[`template`]**: tier layout and the path mapper
//! - **[`resources`]**: idempotent `check + apply` filesystem primitives
//! - **[`engine`]**: apply, track, conflict detection and resolution
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod logging;
pub mod prompt;
pub mod repository;
pub mod resources;
pub mod template;

/// Version string stamped at build time, or the crate version for dev builds.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTPILOT_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")))
}
