//! Deployment endpoints

use crate::BridgeClient;
use crate::error::{ClientError, Result};
use bridge_core::domain::{Deployment, DeploymentStep};
use bridge_core::dto::deployment::{
    CreateDeployment, CreateDeploymentResponse, DeploymentList, DeploymentResponse, StepList,
};

impl BridgeClient {
    /// Create a deployment and start provisioning it
    ///
    /// The returned deployment is `pending`; its steps are created on the
    /// server and can be fetched with [`BridgeClient::get_deployment`].
    pub async fn create_deployment(&self, req: CreateDeployment) -> Result<Deployment> {
        for (field, value) in [
            ("name", &req.name),
            ("docker_image", &req.docker_image),
            ("domain", &req.domain),
        ] {
            if value.trim().is_empty() {
                return Err(ClientError::InvalidRequest(format!("{} is required", field)));
            }
        }

        let response = self
            .client
            .post(self.url("/deployments"))
            .json(&req)
            .send()
            .await?;

        let created: CreateDeploymentResponse = self.handle_response(response).await?;
        Ok(created.deployment)
    }

    /// List all deployments, newest first
    pub async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        let response = self.client.get(self.url("/deployments")).send().await?;

        let list: DeploymentList = self.handle_response(response).await?;
        Ok(list.deployments)
    }

    /// Get a deployment with its steps
    pub async fn get_deployment(&self, id: i64) -> Result<Deployment> {
        let url = self.url(&format!("/deployments/{}", id));
        let response = self.client.get(url).send().await?;

        let found: DeploymentResponse = self.handle_response(response).await?;
        Ok(found.deployment)
    }

    /// Get the steps of a deployment
    ///
    /// An unknown deployment yields an empty list.
    pub async fn get_steps(&self, id: i64) -> Result<Vec<DeploymentStep>> {
        let url = self.url(&format!("/deployments/{}/steps", id));
        let response = self.client.get(url).send().await?;

        let list: StepList = self.handle_response(response).await?;
        Ok(list.steps)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_server::serve_once;
    use crate::{BridgeClient, ClientError};
    use bridge_core::domain::{DeploymentStatus, StepStatus};
    use bridge_core::dto::deployment::CreateDeployment;

    const DEPLOYMENT: &str = r#"{
        "id": 3,
        "name": "api",
        "status": "running",
        "docker_image": "img:1",
        "env_config": "",
        "domain": "api.example.com",
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:05:00Z",
        "steps": [{
            "id": 11,
            "deployment_id": 3,
            "step_name": "route53",
            "status": "running",
            "message": "",
            "started_at": "2024-05-01T10:01:00Z",
            "completed_at": null,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:01:00Z"
        }]
    }"#;

    #[tokio::test]
    async fn test_get_deployment() {
        let body = format!(r#"{{"deployment": {}}}"#, DEPLOYMENT);
        let (url, request) = serve_once("200 OK", &body).await;

        let deployment = BridgeClient::new(url).get_deployment(3).await.unwrap();
        assert_eq!(deployment.id, 3);
        assert_eq!(deployment.status, DeploymentStatus::Running);
        assert_eq!(deployment.steps[0].status, StepStatus::Running);
        assert!(request.await.unwrap().starts_with("GET /api/v1/deployments/3 "));
    }

    #[tokio::test]
    async fn test_get_deployment_not_found() {
        let (url, _request) =
            serve_once("404 Not Found", r#"{"error":"Deployment 3 not found"}"#).await;

        let err = BridgeClient::new(url).get_deployment(3).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Deployment 3 not found"));
    }

    #[tokio::test]
    async fn test_create_deployment_posts_body() {
        let body = format!(r#"{{"message":"Deployment started","deployment": {}}}"#, DEPLOYMENT);
        let (url, request) = serve_once("201 Created", &body).await;

        let deployment = BridgeClient::new(url)
            .create_deployment(CreateDeployment {
                name: "api".to_string(),
                docker_image: "img:1".to_string(),
                env_config: Some("LOG_LEVEL=debug".to_string()),
                domain: "api.example.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(deployment.name, "api");

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /api/v1/deployments "));
        assert!(request.contains(r#""env_config":"LOG_LEVEL=debug""#));
    }

    #[tokio::test]
    async fn test_create_deployment_rejects_blank_fields_locally() {
        let client = BridgeClient::new("http://127.0.0.1:1");
        let err = client
            .create_deployment(CreateDeployment {
                name: "api".to_string(),
                docker_image: " ".to_string(),
                env_config: None,
                domain: "api.example.com".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidRequest(ref m) if m.contains("docker_image")));
    }

    #[tokio::test]
    async fn test_list_and_steps() {
        let body = format!(r#"{{"deployments": [{}]}}"#, DEPLOYMENT);
        let (url, _request) = serve_once("200 OK", &body).await;
        let deployments = BridgeClient::new(url).list_deployments().await.unwrap();
        assert_eq!(deployments.len(), 1);

        let (url, request) = serve_once("200 OK", r#"{"steps": []}"#).await;
        let steps = BridgeClient::new(url).get_steps(42).await.unwrap();
        assert!(steps.is_empty());
        assert!(request.await.unwrap().starts_with("GET /api/v1/deployments/42/steps "));
    }
}
