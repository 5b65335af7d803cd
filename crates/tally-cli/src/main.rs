//! Tally CLI - Financial analytics over exported transactions
//!
//! Usage:
//!   tally --data data.json categorize "Пятерочка 1234"   Predict a category
//!   tally --data data.json forecast --periods 3          Forecast monthly expenses
//!   tally --data data.json anomalies                     Flag unusual spending
//!   tally --data data.json health                        Score financial health

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let ws = commands::load_workspace(
        cli.data.as_deref(),
        cli.transactions.as_deref(),
        cli.config.as_deref(),
    )?;

    match cli.command {
        Commands::Categorize { description } => commands::cmd_categorize(&ws, &description),
        Commands::CategorizeAll => commands::cmd_categorize_all(&ws),
        Commands::Patterns => commands::cmd_patterns(&ws),
        Commands::SuggestRules => commands::cmd_suggest_rules(&ws),
        Commands::RulesTest { description } => commands::cmd_rules_test(&ws, &description),
        Commands::Forecast { periods } => commands::cmd_forecast(&ws, periods),
        Commands::Trend { window, alpha } => commands::cmd_trend(&ws, window, alpha),
        Commands::Anomalies { transaction, today } => {
            commands::cmd_anomalies(&ws, transaction, today.as_deref())
        }
        Commands::Health { today } => commands::cmd_health(&ws, today.as_deref()),
        Commands::Config => commands::cmd_config(&ws, cli.config.as_deref()),
    }
}
