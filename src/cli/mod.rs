pub mod auto;
pub mod convert;
pub mod jobs;
pub mod link;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ledgerpipe",
    about = "Converts bank statement exports and aggregator feeds into normalized ledger transactions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one source into a transaction batch and persist it.
    Convert {
        /// Path to a JSON configuration file
        #[arg(long)]
        config: String,
        /// CSV file to convert (csv flow; overrides the configured path)
        #[arg(long)]
        file: Option<String>,
        /// Reuse an existing job identifier instead of minting one
        #[arg(long)]
        identifier: Option<String>,
    },
    /// Poll the status of a conversion job.
    Status {
        /// Job identifier returned by `convert`
        identifier: Option<String>,
    },
    /// Convert every configuration/CSV file set found in a directory.
    Auto {
        /// Directory holding <name>.json configuration files (default: .)
        directory: Option<String>,
    },
    /// Link or refresh the aggregator session for a configuration.
    Link {
        /// Path to a JSON configuration file
        #[arg(long)]
        config: String,
    },
    /// List known conversion jobs.
    Jobs,
}
