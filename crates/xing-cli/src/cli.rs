//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use xing_core::Status;

/// Shared level-crossing barrier tracker.
///
/// Records open/closed reports, keeps them in sync with other devices and
/// predicts the barrier state from past reports.
#[derive(Debug, Parser)]
#[command(name = "xing", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report the barrier as open or closed.
    Record {
        /// Observed status.
        #[arg(value_name = "open|closed")]
        status: Status,
    },

    /// Show the current barrier status and the last report.
    Status {
        /// Also read the shared status from the remote ledger.
        #[arg(long)]
        remote: bool,
    },

    /// Pull reports from the remote ledger.
    Sync {
        /// Keep syncing periodically until interrupted.
        #[arg(long)]
        watch: bool,
    },

    /// Predict the barrier status in the near future.
    Predict {
        /// Minutes from now.
        #[arg(long = "in", value_name = "MINUTES", default_value_t = 0)]
        in_minutes: u32,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show report statistics.
    Stats {
        /// Trailing window in days (defaults to the configured window).
        #[arg(long)]
        days: Option<u32>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print stored reports as JSON Lines, oldest first.
    Events {
        /// Only print the newest N reports.
        #[arg(long)]
        limit: Option<usize>,
    },
}
