//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};
use tracing::error;

use crate::exit_codes::error_to_exit_code;
use crate::logging;
use crate::run_context::RunType;

#[derive(Debug, Parser)]
#[command(name = "parkdaily", version, about = "Daily park digest pipeline")]
pub struct Cli {
    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate and publish today's digest
    Run {
        /// Clear date-seeded cache entries and recompute today's picks
        #[arg(long)]
        force: bool,

        /// Record this as a retry run (set by the retry-checker)
        #[arg(long)]
        retry: bool,

        /// Operator label recorded in the run log
        #[arg(long)]
        tag: Option<String>,
    },

    /// Generate and publish the web snapshot
    Web {
        /// Clear date-seeded cache entries and recompute today's picks
        #[arg(long)]
        force: bool,
    },

    /// Launch a retry run if today has no successful primary run
    RetryCheck {
        /// Log the intended action without launching anything
        #[arg(long)]
        dry_run: bool,

        /// Operator label passed through to the launched run
        #[arg(long)]
        tag: Option<String>,
    },

    /// Print the rolling status history
    Status,
}

/// Parse arguments, dispatch, and map the outcome to a process exit
/// code. Never panics and never calls `process::exit` itself.
pub fn run() -> i32 {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Run { force, retry, tag } => {
            let run_type = if retry { RunType::Retry } else { RunType::Primary };
            commands::run_digest(run_type, force, tag.as_deref())
        }
        Command::Web { force } => commands::run_digest(RunType::WebUpdate, force, None),
        Command::RetryCheck { dry_run, tag } => commands::retry_check(dry_run, tag),
        Command::Status => commands::status(),
    };

    match result {
        Ok(code) => code.as_i32(),
        Err(err) => {
            error!(error = %err, "fatal error");
            error_to_exit_code(&err).as_i32()
        }
    }
}
