//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::commands::Commands;

/// Manage ordered content collections in a local store.
#[derive(Parser, Debug)]
#[command(name = "curator")]
#[command(author, version = env!("CURATOR_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the store lives and how it behaves.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, env = "CURATOR_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Database name
    #[arg(long, env = "CURATOR_DATABASE", default_value = "content", global = true)]
    pub database: String,

    /// Global asset size ceiling in MiB; only lowers per-collection limits
    #[arg(long, env = "CURATOR_MAX_ASSET_MB", global = true)]
    pub max_asset_mb: Option<u64>,

    /// Offset from UTC, in minutes, used to display timestamps
    #[arg(
        long,
        env = "CURATOR_UTC_OFFSET",
        default_value_t = 0,
        allow_negative_numbers = true,
        global = true
    )]
    pub utc_offset: i32,
}
