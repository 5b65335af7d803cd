//! CLI command implementations
//!
//! Commands are organized by engine component:
//! - `core` - Shared utilities (load_workspace, print_json, parse_today)
//! - `categorize` - Category prediction, learned patterns and rule suggestions
//! - `forecast` - Expense forecast and trend commands
//! - `anomalies` - Transaction and spending pattern anomaly detection
//! - `health` - Financial health scoring
//! - `config` - Effective configuration display

pub mod anomalies;
pub mod categorize;
pub mod config;
pub mod core;
pub mod forecast;
pub mod health;

// Re-export command functions for main.rs
pub use anomalies::*;
pub use categorize::*;
pub use config::*;
pub use core::*;
pub use forecast::*;
pub use health::*;
