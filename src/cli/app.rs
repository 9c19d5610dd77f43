//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::precondition;
use super::timeline::{self, TimelineInputs};
use crate::domain::{GroupId, ProcessId};
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "pfd")]
#[command(author, version, about = "Structural analysis for process-flow-diagram models")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project config file to use instead of `.pfd/config.toml`
    #[arg(long, global = true, env = "PFD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a precondition expression and print its structure
    Parse {
        /// Precondition text, e.g. '\exec(P1) && \complete(*)'
        text: String,

        /// Process owning the precondition; `\complete(*)` refers to it
        #[arg(long, default_value = "self")]
        context: ProcessId,
    },

    /// Check a precondition table for syntax errors and cyclic references
    Check {
        /// JSON or JSONL table of {process, precondition} rows
        table: PathBuf,
    },

    /// Show milestone start and end per group in business time
    Timeline {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Show milestone start and end per group on the calendar
    Schedule {
        #[command(flatten)]
        inputs: InputArgs,

        /// Project start date (overrides `project_start` in the config)
        #[arg(long)]
        start: Option<NaiveDate>,
    },
}

/// Plan and milestone inputs
#[derive(clap::Args)]
pub struct InputArgs {
    /// Simulated plan (JSON)
    #[arg(long)]
    pub plan: PathBuf,

    /// Milestone table (JSON or JSONL)
    #[arg(long)]
    pub milestones: PathBuf,

    /// Restrict output to one group
    #[arg(long)]
    pub group: Option<GroupId>,
}

impl InputArgs {
    fn as_inputs(&self) -> TimelineInputs<'_> {
        TimelineInputs {
            plan: &self.plan,
            milestones: &self.milestones,
            group: self.group.as_ref(),
        }
    }
}

/// Main entry point for the CLI
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let output = Output::new(cli.format.unwrap_or(config.global.default_format));

    match &config.project_file {
        Some(path) => log::debug!("using project config {}", path.display()),
        None => log::debug!("no project config found, using defaults"),
    }

    match cli.command {
        Commands::Parse { text, context } => precondition::parse(&output, &text, &context)?,
        Commands::Check { table } => precondition::check(&output, &table)?,
        Commands::Timeline { inputs } => timeline::timeline(&output, &inputs.as_inputs())?,
        Commands::Schedule { inputs, start } => {
            timeline::schedule(&output, &config, &inputs.as_inputs(), start)?
        }
    }

    log::debug!("command completed successfully");
    Ok(())
}
