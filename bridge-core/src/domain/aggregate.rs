//! Status aggregation
//!
//! Derives a deployment's overall status from the statuses of its steps.
//! The result is recomputed from scratch on every callback, so a deployment
//! can move back from `completed` to `running` if a step re-enters running.

use crate::domain::deployment::DeploymentStatus;
use crate::domain::step::{DeploymentStep, StepStatus};

/// Computes the overall status of a deployment from its steps.
///
/// Returns `None` when no rule applies (a mix of pending and completed steps),
/// in which case the stored deployment status must be left unchanged.
pub fn aggregate(steps: &[DeploymentStep]) -> Option<DeploymentStatus> {
    aggregate_statuses(steps.iter().map(|s| &s.status))
}

/// Same as [`aggregate`], over bare statuses.
///
/// Precedence: any failed, then any running, then all completed.
pub fn aggregate_statuses<'a>(
    statuses: impl IntoIterator<Item = &'a StepStatus>,
) -> Option<DeploymentStatus> {
    let mut any_running = false;
    let mut all_completed = true;

    for status in statuses {
        match status {
            StepStatus::Failed => return Some(DeploymentStatus::Failed),
            StepStatus::Running => {
                any_running = true;
                all_completed = false;
            }
            StepStatus::Completed => {}
            StepStatus::Pending | StepStatus::Other(_) => all_completed = false,
        }
    }

    if any_running {
        Some(DeploymentStatus::Running)
    } else if all_completed {
        Some(DeploymentStatus::Completed)
    } else {
        None
    }
}
