//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Finance analytics reports over an exported account snapshot
#[derive(Parser)]
#[command(name = "finance-cli")]
#[command(about = "Tax, budget and portfolio reports as JSON", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Snapshot file (overrides FINANCE_SNAPSHOT_PATH)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Estimate federal tax liability for the configured tax year
    Tax,

    /// Month-to-date budget status, recurring charges and unusual spending
    Budget,

    /// Asset allocation drift against the target allocation
    Allocation,

    /// Tax-loss harvesting opportunities with wash sale checks
    Harvest {
        /// Only consider this ticker
        #[arg(long)]
        ticker: Option<String>,

        /// Days either side of today searched for repurchases
        #[arg(long, default_value_t = 30)]
        lookback_days: i64,
    },

    /// Portfolio totals, period returns and concentration
    Performance,

    /// Assign categories to uncategorized transactions
    Categorize,
}
