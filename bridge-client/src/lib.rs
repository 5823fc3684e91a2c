//! Bridge HTTP Client
//!
//! A small, type-safe HTTP client for the Bridge deployment API. The CLI
//! uses it for every command, and provisioning hooks can use it to report
//! step progress.
//!
//! # Example
//!
//! ```no_run
//! use bridge_client::BridgeClient;
//! use bridge_core::dto::deployment::CreateDeployment;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BridgeClient::new("http://localhost:8080");
//!
//!     let deployment = client.create_deployment(CreateDeployment {
//!         name: "api".to_string(),
//!         docker_image: "registry.local/api:1.4.2".to_string(),
//!         env_config: None,
//!         domain: "api.example.com".to_string(),
//!     }).await?;
//!
//!     println!("Created deployment: {}", deployment.id);
//!     Ok(())
//! }
//! ```

mod callback;
mod deployments;
pub mod error;

// Re-export commonly used types
pub use error::{ClientError, Result};

use bridge_core::dto::health::HealthStatus;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Bridge API
///
/// Methods are grouped the same way as the server endpoints:
/// - Deployment management (create, list, get, steps)
/// - Provisioner callbacks
/// - Health
#[derive(Debug, Clone)]
pub struct BridgeClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl BridgeClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use bridge_client::BridgeClient;
    ///
    /// let client = BridgeClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Check server health
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.url("/health")).send().await?;

        self.handle_response(response).await
    }

    /// Handle an API response and deserialize JSON
    ///
    /// Non-success statuses become `ClientError::ApiError` carrying the
    /// server's error message.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!(status = status.as_u16(), "API request failed");
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot HTTP responder for exercising the client without a server

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serves a single canned response and reports the request head
    pub async fn serve_once(status: &str, body: &str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // Read the head, then whatever body the content-length announces
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&request).to_string());
        });

        (format!("http://{}", addr), rx)
    }
}
