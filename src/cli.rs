//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use ohmc_sync_core::{DEFAULT_LOOKBACK_DAYS, DEFAULT_SERVER_ROOT};

/// Discover and catalog meteorological imagery from the OHMC file server.
///
/// ohmc-sync crawls the server's directory listings, decodes product
/// filenames into run/valid times, reconciles everything into a local
/// catalog, and optionally downloads the images themselves.
#[derive(Parser, Debug)]
#[command(name = "ohmc-sync")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover remote products and reconcile them into the catalog
    Sync(SyncArgs),
    /// Print catalog statistics and availability summaries
    Stats(StatsArgs),
}

/// Arguments of the `sync` subcommand.
#[derive(clap::Args, Debug)]
pub struct SyncArgs {
    /// Sync a single product family instead of all of them
    #[arg(long)]
    pub family: Option<String>,

    /// Lookback window in days; older runs are skipped
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    pub days: u32,

    /// Year to crawl, for historical backfill (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Month to crawl, 1-12 (defaults to the current month)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Explicit window start (YYYY-MM-DD); overrides --days
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Skip image materialization
    #[arg(long)]
    pub no_images: bool,

    /// Path of the catalog database
    #[arg(long, default_value = "catalog.db")]
    pub db: PathBuf,

    /// Directory materialized images are stored under
    #[arg(long, default_value = "media")]
    pub media_dir: PathBuf,

    /// Root URL of the file server (override to crawl a mirror)
    #[arg(long, default_value = DEFAULT_SERVER_ROOT)]
    pub server_root: String,
}

/// Arguments of the `stats` subcommand.
#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Path of the catalog database
    #[arg(long, default_value = "catalog.db")]
    pub db: PathBuf,

    /// Restrict summaries to one product family
    #[arg(long)]
    pub family: Option<String>,

    /// Emit machine-readable JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Parses a `YYYY-MM-DD` date argument.
fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date (expected YYYY-MM-DD): {value}"))
}
