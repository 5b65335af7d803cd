//! Shared command utilities
//!
//! This module contains:
//! - `Workspace` - Dataset plus engine config, loaded once per invocation
//! - `load_workspace` - Build a workspace from the global CLI paths
//! - `print_json` - Pretty JSON output
//! - `parse_today` - Resolve `--today`

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tally_core::import::{load_dataset, parse_csv};
use tally_core::{load_config, Dataset, EngineConfig};
use tracing::debug;

/// Everything a command needs to run the engine
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub dataset: Dataset,
    pub config: EngineConfig,
}

/// Load the dataset and config named on the command line
///
/// Without `--data` the dataset starts empty. `--transactions` replaces
/// whatever transactions the dataset carried.
pub fn load_workspace(
    data: Option<&Path>,
    transactions: Option<&Path>,
    config: Option<&Path>,
) -> Result<Workspace> {
    let mut dataset = match data {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open dataset {}", path.display()))?;
            load_dataset(file)
                .with_context(|| format!("Failed to read dataset {}", path.display()))?
        }
        None => Dataset::default(),
    };

    if let Some(path) = transactions {
        let file = File::open(path)
            .with_context(|| format!("Failed to open transactions {}", path.display()))?;
        dataset.transactions = parse_csv(file)
            .with_context(|| format!("Failed to parse transactions {}", path.display()))?;
    }

    let config = load_config(config).context("Failed to load engine config")?;

    debug!(
        transactions = dataset.transactions.len(),
        categories = dataset.categories.len(),
        "Workspace ready"
    );

    Ok(Workspace { dataset, config })
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Parse `--today`, defaulting to the local date
pub fn parse_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
