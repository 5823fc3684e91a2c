//! Provisioner callback endpoint

use crate::BridgeClient;
use crate::error::{ClientError, Result};
use bridge_core::domain::DeploymentStep;
use bridge_core::dto::callback::{CallbackRequest, CallbackResponse};

impl BridgeClient {
    /// Report a step status change
    ///
    /// Returns the step as stored after the update.
    pub async fn send_callback(&self, req: CallbackRequest) -> Result<DeploymentStep> {
        if req.step_name.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "step_name is required".to_string(),
            ));
        }

        tracing::debug!(
            deployment_id = req.deployment_id,
            step = %req.step_name,
            status = %req.status,
            "Sending callback"
        );

        let response = self
            .client
            .post(self.url("/infra/callback"))
            .json(&req)
            .send()
            .await?;

        let processed: CallbackResponse = self.handle_response(response).await?;
        Ok(processed.step)
    }
}
