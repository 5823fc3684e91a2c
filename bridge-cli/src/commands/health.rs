//! Health command handler

use anyhow::{Context, Result};
use colored::*;

use super::print_json;
use crate::config::Config;

/// Check that the server is up
pub async fn check_health(config: &Config) -> Result<()> {
    let health = config
        .client()?
        .health()
        .await
        .with_context(|| format!("Server at {} is not reachable", config.server_url))?;

    if config.json {
        return print_json(&health);
    }

    println!(
        "{} {} is {} ({})",
        "✓".green(),
        health.service.bold(),
        health.status.green(),
        health.time.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}
