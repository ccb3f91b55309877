//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Editor activity tracker.
///
/// Reads editor change events, classifies each edit as typed, pasted or
/// deleted, and reports per-file line counts to a metrics backend.
#[derive(Debug, Parser)]
#[command(name = "et", version, about, long_about = None)]
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
    /// Track editor events read as JSON lines from stdin until EOF.
    Run,

    /// Classify a single change and print the result.
    Classify {
        /// Inserted text.
        #[arg(long, default_value = "")]
        text: String,

        /// Length of the replaced range.
        #[arg(long, default_value_t = 0)]
        range_length: u64,

        /// Clipboard contents to compare against.
        #[arg(long, default_value = "")]
        clipboard: String,
    },

    /// Show the backend's totals for a day.
    Summary {
        /// Day to report, as YYYY-MM-DD. Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report whether a path would be tracked.
    CheckPath {
        /// File path as the editor reports it.
        path: String,
    },

    /// Print the effective configuration.
    Config,
}
