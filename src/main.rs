//! pfd - Structural analysis for process-flow-diagram models

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use pfd_analyzer::cli::Cli;

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = pfd_analyzer::cli::run(args) {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
