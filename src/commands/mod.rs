//! Subcommand handlers for the CLI binary.

mod stats;
mod sync;

pub use stats::run_stats_command;
pub use sync::run_sync_command;
