//! Deployment command handlers
//!
//! Handles creating deployments and inspecting their progress.

use anyhow::{Context, Result};
use bridge_client::BridgeClient;
use bridge_core::domain::{Deployment, DeploymentStep};
use bridge_core::dto::deployment::CreateDeployment;
use clap::Subcommand;
use colored::*;

use super::{colorize_deployment_status, colorize_step_status, print_json};
use crate::config::Config;

/// Deployment subcommands
#[derive(Subcommand)]
pub enum DeploymentCommands {
    /// Create a deployment and start provisioning
    Create {
        /// Deployment name
        #[arg(long)]
        name: String,

        /// Container image to deploy
        #[arg(long)]
        image: String,

        /// Domain to expose the deployment on
        #[arg(long)]
        domain: String,

        /// Environment configuration passed to the provisioner
        #[arg(long)]
        env_config: Option<String>,
    },
    /// List all deployments
    List,
    /// Get deployment details
    Get {
        /// Deployment ID
        id: i64,
    },
    /// List the steps of a deployment
    Steps {
        /// Deployment ID
        id: i64,
    },
}

/// Handle deployment commands
pub async fn handle_deployment_command(command: DeploymentCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        DeploymentCommands::Create {
            name,
            image,
            domain,
            env_config,
        } => {
            let req = CreateDeployment {
                name,
                docker_image: image,
                env_config,
                domain,
            };
            create_deployment(&client, req, config.json).await
        }
        DeploymentCommands::List => list_deployments(&client, config.json).await,
        DeploymentCommands::Get { id } => get_deployment(&client, id, config.json).await,
        DeploymentCommands::Steps { id } => list_steps(&client, id, config.json).await,
    }
}

async fn create_deployment(client: &BridgeClient, req: CreateDeployment, json: bool) -> Result<()> {
    let deployment = client
        .create_deployment(req)
        .await
        .context("Failed to create deployment")?;

    if json {
        return print_json(&deployment);
    }

    println!(
        "{} Deployment {} created",
        "✓".green(),
        deployment.id.to_string().cyan()
    );
    println!("  Name:   {}", deployment.name);
    println!("  Domain: {}", deployment.domain);
    println!("  Status: {}", colorize_deployment_status(&deployment.status));
    println!();
    println!(
        "Follow progress with: {}",
        format!("bridge deployment steps {}", deployment.id).bold()
    );

    Ok(())
}

async fn list_deployments(client: &BridgeClient, json: bool) -> Result<()> {
    let deployments = client
        .list_deployments()
        .await
        .context("Failed to list deployments")?;

    if json {
        return print_json(&deployments);
    }

    if deployments.is_empty() {
        println!("{}", "No deployments found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} deployment(s):", deployments.len()).bold()
        );
        println!();
        for deployment in &deployments {
            print_deployment_summary(deployment);
        }
    }

    Ok(())
}

async fn get_deployment(client: &BridgeClient, id: i64, json: bool) -> Result<()> {
    let deployment = client
        .get_deployment(id)
        .await
        .with_context(|| format!("Failed to get deployment {}", id))?;

    if json {
        return print_json(&deployment);
    }

    print_deployment_details(&deployment);

    Ok(())
}

async fn list_steps(client: &BridgeClient, id: i64, json: bool) -> Result<()> {
    let steps = client
        .get_steps(id)
        .await
        .with_context(|| format!("Failed to get steps of deployment {}", id))?;

    if json {
        return print_json(&steps);
    }

    if steps.is_empty() {
        println!("{}", format!("No steps found for deployment {}.", id).yellow());
    } else {
        for step in &steps {
            print_step(step);
        }
    }

    Ok(())
}

/// Print a one-block summary of a deployment
fn print_deployment_summary(deployment: &Deployment) {
    let done = deployment
        .steps
        .iter()
        .filter(|s| s.status.is_terminal())
        .count();

    println!(
        "  {} Deployment {} {}",
        "▸".cyan(),
        deployment.id.to_string().cyan(),
        deployment.name.bold()
    );
    println!(
        "    Status:  {}",
        colorize_deployment_status(&deployment.status)
    );
    println!("    Domain:  {}", deployment.domain);
    println!("    Steps:   {}/{}", done, deployment.steps.len());
    println!(
        "    Created: {}",
        deployment
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed deployment information
fn print_deployment_details(deployment: &Deployment) {
    println!("{}", "Deployment Details:".bold());
    println!("  ID:      {}", deployment.id.to_string().cyan());
    println!("  Name:    {}", deployment.name);
    println!(
        "  Status:  {}",
        colorize_deployment_status(&deployment.status)
    );
    println!("  Image:   {}", deployment.docker_image);
    println!("  Domain:  {}", deployment.domain);
    println!(
        "  Created: {}",
        deployment.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated: {}",
        deployment.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if !deployment.env_config.is_empty() {
        println!("\n{}", "Environment:".bold());
        println!("{}", deployment.env_config.dimmed());
    }

    if !deployment.steps.is_empty() {
        println!("\n{}", "Steps:".bold());
        for step in &deployment.steps {
            print_step(step);
        }
    }
}

/// Print a step line, with its message and timing when known
fn print_step(step: &DeploymentStep) {
    println!(
        "  {:<16} {}",
        step.step_name,
        colorize_step_status(&step.status)
    );

    if let (Some(started), Some(completed)) = (step.started_at, step.completed_at) {
        let seconds = completed.signed_duration_since(started).num_seconds();
        println!("  {:<16} {}", "", format!("took {}s", seconds).dimmed());
    }

    if !step.message.is_empty() {
        println!("  {:<16} {}", "", step.message.dimmed());
    }
}
