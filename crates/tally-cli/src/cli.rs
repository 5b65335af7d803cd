//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Financial analytics for your transactions
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Categorize, forecast, flag anomalies and score financial health", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Dataset JSON (transactions, categories, budgets, goals, rules, snapshots)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Transactions CSV; replaces the dataset's transactions
    #[arg(long, global = true)]
    pub transactions: Option<PathBuf>,

    /// Engine config TOML (defaults to the data dir override, then built-ins)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the category of a description
    Categorize {
        /// Transaction description
        description: String,
    },

    /// Predict categories for every uncategorized transaction
    CategorizeAll,

    /// Show recurring description patterns per category
    Patterns,

    /// Suggest rules for groups of uncategorized transactions
    SuggestRules,

    /// Show which rules match a description, in evaluation order
    RulesTest {
        /// Transaction description
        description: String,
    },

    /// Forecast monthly expenses
    Forecast {
        /// Months to forecast
        #[arg(short, long, default_value = "3")]
        periods: usize,
    },

    /// Classify monthly income and expense trends
    Trend {
        /// Moving average window (months)
        #[arg(short, long, default_value = "3")]
        window: usize,

        /// Exponential moving average smoothing factor (0-1)
        #[arg(short, long, default_value = "0.3")]
        alpha: f64,
    },

    /// Detect anomalies in one transaction or across all spending
    Anomalies {
        /// Only check this transaction
        #[arg(short, long)]
        transaction: Option<i64>,

        /// Detection date recorded on results (YYYY-MM-DD, default today)
        #[arg(long)]
        today: Option<String>,
    },

    /// Score financial health for the current month
    Health {
        /// Date to score (YYYY-MM-DD, default today)
        #[arg(long)]
        today: Option<String>,
    },

    /// Show the effective engine configuration
    Config,
}
