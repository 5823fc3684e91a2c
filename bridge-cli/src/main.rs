//! Bridge CLI
//!
//! Command-line interface for the Bridge deployment tracking server.

mod commands;
mod config;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "bridge")]
#[command(about = "Bridge deployment tracking CLI", long_about = None)]
struct Cli {
    /// Bridge server URL
    #[arg(long, env = "BRIDGE_SERVER_URL", default_value = "http://localhost:8080")]
    server_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        timeout: Duration::from_secs(cli.timeout),
        json: cli.json,
    };

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_callback_send() {
        let cli = Cli::try_parse_from([
            "bridge",
            "--server-url",
            "http://bridge:8080",
            "callback",
            "send",
            "4",
            "ingress",
            "completed",
            "--message",
            "ingress ready",
        ])
        .unwrap();

        assert_eq!(cli.server_url, "http://bridge:8080");
        assert!(matches!(cli.command, Commands::Callback { .. }));
    }
}
