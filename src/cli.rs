use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::template::TierSkips;

/// Top-level CLI entry point for dotpilot.
#[derive(Parser, Debug)]
#[command(
    name = "dotpilot",
    about = "Layered dotfiles manager: one template tree, many machines",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Template root (default: $DOTPILOT_ROOT, then ~/.dotpilot)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// State file (default: ~/.dotpilotrc)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Environment tier to apply (default: current_environment from the state file)
    #[arg(short, long = "env", global = true)]
    pub environment: Option<String>,

    /// Hostname selecting the machine tier (default: this machine's hostname)
    #[arg(long, global = true)]
    pub hostname: Option<String>,

    /// Leave the common tier out of apply and conflict scans
    #[arg(long, global = true)]
    pub skip_common: bool,

    /// Leave the environment tier out of apply and conflict scans
    #[arg(long, global = true)]
    pub skip_env: bool,

    /// Leave the machine tier out of apply and conflict scans
    #[arg(long, global = true)]
    pub skip_machine: bool,
}

impl GlobalOpts {
    /// Tiers the user asked to leave out.
    #[must_use]
    pub const fn tier_skips(&self) -> TierSkips {
        TierSkips {
            common: self.skip_common,
            environment: self.skip_env,
            machine: self.skip_machine,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the template tree and state file
    Init(InitOpts),
    /// Link the template tree into the home directory
    Apply(ApplyOpts),
    /// Move files into the template tree and link them back
    Track(TrackOpts),
    /// List live paths that diverge from the template tree
    Conflicts,
    /// Resolve diverged live paths
    Resolve(ResolveOpts),
    /// Pull, apply, check conflicts, commit and push
    Sync(SyncOpts),
    /// Show environment, tracked paths and repository state
    Status,
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Options for the `init` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct InitOpts {
    /// Clone the template tree from this repository
    #[arg(long)]
    pub remote: Option<String>,

    /// Remove an existing template root first
    #[arg(long)]
    pub force: bool,
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct ApplyOpts {
    /// Replace diverged files without backing them up
    #[arg(long)]
    pub no_backup: bool,

    /// Replace diverged files without showing a diff first
    #[arg(long)]
    pub no_diff_prompt: bool,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

/// Options for the `track` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct TrackOpts {
    /// Files or directories to track
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Destination inside the template tree (relative paths are under the root)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Replace an existing template file
    #[arg(long)]
    pub overwrite: bool,

    /// Tier to store into: common, machine, or an environment name
    #[arg(long)]
    pub tier: Option<String>,
}

/// Options for the `resolve` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ResolveOpts {
    /// interactive, keep-local, keep-remote, merge or backup-both
    #[arg(long, default_value = "interactive")]
    pub strategy: String,
}

/// Options for the `sync` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct SyncOpts {
    #[command(flatten)]
    pub apply: ApplyOpts,

    /// Skip pulling from the remote
    #[arg(long)]
    pub no_pull: bool,

    /// Skip pushing to the remote
    #[arg(long)]
    pub no_push: bool,

    /// Resolve conflicts left after applying
    #[arg(long)]
    pub resolve_conflicts: bool,

    /// Strategy for --resolve-conflicts
    #[arg(long, default_value = "interactive")]
    pub strategy: String,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Apply(_) => "apply",
            Self::Track(_) => "track",
            Self::Conflicts => "conflicts",
            Self::Resolve(_) => "resolve",
            Self::Sync(_) => "sync",
            Self::Status => "status",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply_flags() {
        let cli = Cli::parse_from(["dotpilot", "apply", "--no-backup", "--dry-run"]);
        assert!(
            matches!(&cli.command, Command::Apply(_)),
            "Expected Apply command"
        );
        if let Command::Apply(opts) = cli.command {
            assert!(opts.no_backup);
            assert!(opts.dry_run);
            assert!(!opts.no_diff_prompt);
        }
    }

    #[test]
    fn parse_global_overrides() {
        let cli = Cli::parse_from([
            "dotpilot",
            "--root",
            "/tmp/dots",
            "-e",
            "work",
            "--hostname",
            "box",
            "status",
        ]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/tmp/dots")));
        assert_eq!(cli.global.environment.as_deref(), Some("work"));
        assert_eq!(cli.global.hostname.as_deref(), Some("box"));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["dotpilot", "apply", "--env", "work", "-v"]);
        assert_eq!(cli.global.environment.as_deref(), Some("work"));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_track() {
        let cli = Cli::parse_from([
            "dotpilot",
            "track",
            "~/.vimrc",
            "~/.zshrc",
            "--tier",
            "machine",
            "--overwrite",
        ]);
        assert!(
            matches!(&cli.command, Command::Track(_)),
            "Expected Track command"
        );
        if let Command::Track(opts) = cli.command {
            assert_eq!(opts.paths.len(), 2);
            assert_eq!(opts.tier.as_deref(), Some("machine"));
            assert!(opts.overwrite);
            assert_eq!(opts.dest, None);
        }
    }

    #[test]
    fn skip_flags_select_tiers() {
        let cli = Cli::parse_from(["dotpilot", "apply", "--skip-common", "--skip-machine"]);
        assert_eq!(
            cli.global.tier_skips(),
            TierSkips {
                common: true,
                environment: false,
                machine: true,
            }
        );
        let cli = Cli::parse_from(["dotpilot", "conflicts"]);
        assert!(!cli.global.tier_skips().any());
    }

    #[test]
    fn track_requires_a_path() {
        assert!(Cli::try_parse_from(["dotpilot", "track"]).is_err());
    }

    #[test]
    fn resolve_defaults_to_interactive() {
        let cli = Cli::parse_from(["dotpilot", "resolve"]);
        assert!(
            matches!(&cli.command, Command::Resolve(_)),
            "Expected Resolve command"
        );
        if let Command::Resolve(opts) = cli.command {
            assert_eq!(opts.strategy, "interactive");
        }
    }

    #[test]
    fn resolve_passes_strategy_verbatim() {
        let cli = Cli::parse_from(["dotpilot", "resolve", "--strategy", "bogus"]);
        assert!(
            matches!(&cli.command, Command::Resolve(_)),
            "Expected Resolve command"
        );
        if let Command::Resolve(opts) = cli.command {
            assert_eq!(opts.strategy, "bogus");
        }
    }

    #[test]
    fn parse_sync() {
        let cli = Cli::parse_from([
            "dotpilot",
            "sync",
            "--no-push",
            "--no-diff-prompt",
            "--resolve-conflicts",
            "--strategy",
            "keep-remote",
        ]);
        assert!(
            matches!(&cli.command, Command::Sync(_)),
            "Expected Sync command"
        );
        if let Command::Sync(opts) = cli.command {
            assert!(opts.no_push);
            assert!(!opts.no_pull);
            assert!(opts.apply.no_diff_prompt);
            assert!(opts.resolve_conflicts);
            assert_eq!(opts.strategy, "keep-remote");
        }
    }

    #[test]
    fn command_names() {
        let cli = Cli::parse_from(["dotpilot", "conflicts"]);
        assert_eq!(cli.command.name(), "conflicts");
    }
}
