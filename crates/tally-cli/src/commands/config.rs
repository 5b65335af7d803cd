//! Configuration command

use std::path::Path;

use anyhow::Result;
use tally_core::config::default_config_path;
use tracing::info;

use super::core::{print_json, Workspace};

/// Where the effective config was read from
pub fn config_source(explicit: Option<&Path>) -> String {
    match explicit {
        Some(path) => path.display().to_string(),
        None => match default_config_path() {
            Some(path) if path.exists() => path.display().to_string(),
            Some(path) => format!("built-in defaults (override: {})", path.display()),
            None => "built-in defaults".to_string(),
        },
    }
}

/// Log where config comes from and print the values in effect
pub fn cmd_config(ws: &Workspace, explicit: Option<&Path>) -> Result<()> {
    info!(source = %config_source(explicit), "Engine config");
    print_json(&ws.config)
}
