//! Configuration module
//!
//! Handles CLI configuration including the server URL and request timeout.

use std::time::Duration;

use anyhow::{Context, Result};
use bridge_client::BridgeClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Bridge server
    pub server_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Print raw JSON instead of formatted output
    pub json: bool,
}

impl Config {
    /// Builds an API client for this configuration
    pub fn client(&self) -> Result<BridgeClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(BridgeClient::with_client(&self.server_url, http))
    }
}
