//! Deployment domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::step::DeploymentStep;

/// A request to provision a named service with a container image and domain
///
/// Persisted by the server, returned by the API and rendered by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: i64,
    pub name: String,
    pub status: DeploymentStatus,
    pub docker_image: String,
    /// Opaque configuration blob handed to the provisioner as-is
    pub env_config: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub steps: Vec<DeploymentStep>,
}

/// Overall deployment status, derived from its steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Completed => "completed",
            DeploymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DeploymentStatus::Pending),
            "running" => Some(DeploymentStatus::Running),
            "completed" => Some(DeploymentStatus::Completed),
            "failed" => Some(DeploymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
