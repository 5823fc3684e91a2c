//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod callback;
mod deployment;
mod health;

pub use callback::CallbackCommands;
pub use deployment::DeploymentCommands;

use anyhow::Result;
use bridge_core::domain::{DeploymentStatus, StepStatus};
use clap::Subcommand;
use colored::*;
use serde::Serialize;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Deployment management
    Deployment {
        #[command(subcommand)]
        command: DeploymentCommands,
    },
    /// Report step progress as the provisioner would
    Callback {
        #[command(subcommand)]
        command: CallbackCommands,
    },
    /// Check server health
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Deployment { command } => {
            deployment::handle_deployment_command(command, config).await
        }
        Commands::Callback { command } => callback::handle_callback_command(command, config).await,
        Commands::Health => health::check_health(config).await,
    }
}

/// Prints a value as pretty JSON
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Colorize deployment status for display
fn colorize_deployment_status(status: &DeploymentStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        DeploymentStatus::Pending => status_str.yellow(),
        DeploymentStatus::Running => status_str.cyan(),
        DeploymentStatus::Completed => status_str.green(),
        DeploymentStatus::Failed => status_str.red(),
    }
}

/// Colorize step status for display
fn colorize_step_status(status: &StepStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        StepStatus::Pending => status_str.yellow(),
        StepStatus::Running => status_str.cyan(),
        StepStatus::Completed => status_str.green(),
        StepStatus::Failed => status_str.red(),
        StepStatus::Other(_) => status_str.dimmed(),
    }
}
