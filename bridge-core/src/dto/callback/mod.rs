//! Callback DTOs
//!
//! Sent by the provisioning tool each time a step changes status.

use serde::{Deserialize, Serialize};

use crate::domain::step::{DeploymentStep, StepStatus};

/// Step status report from the provisioner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackRequest {
    pub deployment_id: i64,
    pub step_name: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response to a processed callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub message: String,
    pub step: DeploymentStep,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_from_provisioner() {
        let req: CallbackRequest = serde_json::from_str(
            r#"{"deployment_id": 7, "step_name": "ingress", "status": "running", "message": "task started"}"#,
        )
        .unwrap();

        assert_eq!(req.deployment_id, 7);
        assert_eq!(req.step_name, "ingress");
        assert_eq!(req.status, StepStatus::Running);
        assert_eq!(req.message.as_deref(), Some("task started"));
    }

    #[test]
    fn test_message_defaults_to_none() {
        let req: CallbackRequest = serde_json::from_str(
            r#"{"deployment_id": 7, "step_name": "ingress", "status": "completed"}"#,
        )
        .unwrap();

        assert!(req.message.is_none());
    }
}
