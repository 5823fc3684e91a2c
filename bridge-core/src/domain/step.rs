//! Deployment step domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One provisioning sub-task tracked for a deployment.
///
/// Every deployment owns exactly one step per [`StepName`], seeded when the
/// deployment is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStep {
    pub id: i64,
    pub deployment_id: i64,
    pub step_name: String,
    pub status: StepStatus,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentStep {
    /// Applies a status report from the provisioner.
    ///
    /// `started_at` is only set on the first transition to running.
    /// `completed_at` is refreshed on every transition into a terminal state.
    pub fn apply_status(&mut self, status: StepStatus, message: String, now: DateTime<Utc>) {
        if status == StepStatus::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }

        if status.is_terminal() {
            self.completed_at = Some(now);
        }

        self.status = status;
        self.message = message;
        self.updated_at = now;
    }
}

/// The fixed vocabulary of provisioning steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Route53,
    LoadBalancer,
    K8sService,
    Ingress,
    DomainMapping,
}

impl StepName {
    /// All steps, in the order they are seeded.
    pub const ALL: [StepName; 5] = [
        StepName::Route53,
        StepName::LoadBalancer,
        StepName::K8sService,
        StepName::Ingress,
        StepName::DomainMapping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Route53 => "route53",
            StepName::LoadBalancer => "load_balancer",
            StepName::K8sService => "k8s_service",
            StepName::Ingress => "ingress",
            StepName::DomainMapping => "domain_mapping",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == s)
    }

    /// Substrings of a provisioning task name that identify this step
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            StepName::Route53 => &["route53", "dns"],
            StepName::LoadBalancer => &["lb", "load_balancer", "alb", "elb"],
            StepName::K8sService => &["service", "k8s_service", "kubernetes_service"],
            StepName::Ingress => &["ingress", "k8s_ingress"],
            StepName::DomainMapping => &["domain", "mapping", "dns_mapping"],
        }
    }

    /// Maps a provisioning task name to the step it reports on
    ///
    /// Matching is case-insensitive and checks steps in [`StepName::ALL`]
    /// order, so "Create DNS mapping" belongs to `route53`.
    pub fn from_task_name(task_name: &str) -> Option<Self> {
        let task_name = task_name.to_lowercase();
        Self::ALL.into_iter().find(|step| {
            step.keywords()
                .iter()
                .any(|keyword| task_name.contains(keyword))
        })
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single step
///
/// Callbacks may carry values outside the known set. Those are kept verbatim
/// in [`StepStatus::Other`] instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Other(s) => s,
        }
    }

    /// Completed or failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

impl From<String> for StepStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => StepStatus::Pending,
            "running" => StepStatus::Running,
            "completed" => StepStatus::Completed,
            "failed" => StepStatus::Failed,
            _ => StepStatus::Other(s),
        }
    }
}

impl From<&str> for StepStatus {
    fn from(s: &str) -> Self {
        StepStatus::from(s.to_string())
    }
}

impl From<StepStatus> for String {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
