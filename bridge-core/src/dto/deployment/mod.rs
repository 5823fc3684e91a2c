//! Deployment DTOs

use serde::{Deserialize, Serialize};

use crate::domain::deployment::Deployment;
use crate::domain::step::DeploymentStep;

/// Request to create a new deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeployment {
    pub name: String,
    pub docker_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_config: Option<String>,
    pub domain: String,
}

/// Response to a successful create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeploymentResponse {
    pub message: String,
    pub deployment: Deployment,
}

/// Single deployment with its steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResponse {
    pub deployment: Deployment,
}

/// All deployments with their steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentList {
    pub deployments: Vec<Deployment>,
}

/// Steps of one deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepList {
    pub steps: Vec<DeploymentStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_is_optional() {
        let req: CreateDeployment = serde_json::from_value(serde_json::json!({
            "name": "api",
            "docker_image": "img:1",
            "domain": "api.example.com"
        }))
        .unwrap();

        assert_eq!(req.name, "api");
        assert_eq!(req.env_config, None);
    }

    #[test]
    fn test_missing_domain_is_rejected() {
        let result: Result<CreateDeployment, _> = serde_json::from_value(serde_json::json!({
            "name": "api",
            "docker_image": "img:1"
        }));

        assert!(result.is_err());
    }
}
