//! Callback command handlers
//!
//! Posts step status reports the same way the provisioning run does. `send`
//! reports a step directly; `task` derives the step from a task name and
//! the status from a task event.

use anyhow::{Context, Result};
use bridge_core::domain::{StepName, StepStatus};
use bridge_core::dto::callback::CallbackRequest;
use clap::{Subcommand, ValueEnum};
use colored::*;

use super::{colorize_step_status, print_json};
use crate::config::Config;

/// Callback subcommands
#[derive(Subcommand)]
pub enum CallbackCommands {
    /// Report a step status
    Send {
        /// Deployment ID
        deployment_id: i64,

        /// Step name (route53, load_balancer, k8s_service, ingress, domain_mapping)
        step_name: String,

        /// New status (pending, running, completed, failed)
        status: String,

        /// Progress message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Report a provisioning task event
    ///
    /// Every event is mapped to a step by its own task name. No state is kept
    /// between calls, so an ok/failed/unreachable event whose task name
    /// matches no step is skipped rather than attributed to the step of the
    /// last started task.
    Task {
        /// Deployment ID
        deployment_id: i64,

        /// Task name as shown by the provisioning tool
        task_name: String,

        /// Task event
        #[arg(value_enum)]
        event: TaskEvent,

        /// Error detail for failed tasks
        #[arg(short, long)]
        message: Option<String>,
    },
}

/// Lifecycle events of a provisioning task
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskEvent {
    Start,
    Ok,
    Failed,
    Unreachable,
}

impl TaskEvent {
    /// Step status reported for this event
    pub fn status(&self) -> StepStatus {
        match self {
            TaskEvent::Start => StepStatus::Running,
            TaskEvent::Ok => StepStatus::Completed,
            TaskEvent::Failed | TaskEvent::Unreachable => StepStatus::Failed,
        }
    }

    /// Progress message reported for this event
    pub fn message(&self, task_name: &str, detail: Option<&str>) -> String {
        match self {
            TaskEvent::Start => format!("Task started: {}", task_name),
            TaskEvent::Ok => format!("Task completed: {}", task_name),
            TaskEvent::Failed => format!(
                "Task failed: {} - {}",
                task_name,
                detail.unwrap_or("unknown error")
            ),
            TaskEvent::Unreachable => format!("Host unreachable: {}", task_name),
        }
    }
}

/// Builds the callback for a task event, or `None` when the task maps to no step
pub fn task_callback(
    deployment_id: i64,
    task_name: &str,
    event: TaskEvent,
    detail: Option<&str>,
) -> Option<CallbackRequest> {
    let step = StepName::from_task_name(task_name)?;

    Some(CallbackRequest {
        deployment_id,
        step_name: step.to_string(),
        status: event.status(),
        message: Some(event.message(task_name, detail)),
    })
}

/// Handle callback commands
pub async fn handle_callback_command(command: CallbackCommands, config: &Config) -> Result<()> {
    let req = match command {
        CallbackCommands::Send {
            deployment_id,
            step_name,
            status,
            message,
        } => CallbackRequest {
            deployment_id,
            step_name,
            status: StepStatus::from(status),
            message,
        },
        CallbackCommands::Task {
            deployment_id,
            task_name,
            event,
            message,
        } => match task_callback(deployment_id, &task_name, event, message.as_deref()) {
            Some(req) => req,
            None => {
                println!(
                    "{} Task '{}' does not map to a deployment step; nothing sent",
                    "!".yellow(),
                    task_name
                );
                return Ok(());
            }
        },
    };

    send(config, req).await
}

async fn send(config: &Config, req: CallbackRequest) -> Result<()> {
    let deployment_id = req.deployment_id;
    let step = config
        .client()?
        .send_callback(req)
        .await
        .with_context(|| format!("Failed to send callback for deployment {}", deployment_id))?;

    if config.json {
        return print_json(&step);
    }

    println!(
        "{} Deployment {} step {} is now {}",
        "✓".green(),
        step.deployment_id.to_string().cyan(),
        step.step_name.bold(),
        colorize_step_status(&step.status)
    );

    Ok(())
}
