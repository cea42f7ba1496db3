use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use dotpilot_cli::cli::{Cli, Command};
use dotpilot_cli::commands;
use dotpilot_cli::logging::{self, Logger};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let verbose = args.verbose;
    let name = args.command.name();

    // Version and completions write to stdout only and get no log file.
    let start = || {
        logging::init_subscriber(verbose, name);
        Arc::new(Logger::new())
    };

    match args.command {
        Command::Version => {
            commands::version::run();
            Ok(())
        }
        Command::Completions(opts) => {
            commands::completions::run(&opts);
            Ok(())
        }
        Command::Init(opts) => commands::init::run(&args.global, &opts, &start()),
        Command::Apply(opts) => commands::apply::run(&args.global, &opts, &start()),
        Command::Track(opts) => commands::track::run(&args.global, &opts, &start()),
        Command::Conflicts => commands::conflicts::run(&args.global, &start()),
        Command::Resolve(opts) => commands::resolve::run(&args.global, &opts, &start()),
        Command::Sync(opts) => commands::sync::run(&args.global, &opts, &start()),
        Command::Status => commands::status::run(&args.global, &start()),
    }
}
