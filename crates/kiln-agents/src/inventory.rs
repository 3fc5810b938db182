//! Inventory confirmation endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use kiln_core::AgentName;
use serde::{Deserialize, Serialize};

use crate::endpoint::{AgentEndpoint, HttpAgentClient};
use crate::errors::AgentResult;

/// Request to the inventory service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRequest {
    /// Generated marketing caption for the listing.
    pub caption: String,
    /// URL of the enhanced product photo.
    pub image_url: String,
}

/// Response from the inventory service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    /// Human-readable confirmation message.
    pub message: String,
}

/// HTTP client for the inventory confirmation stage.
///
/// Inventory is a fast bookkeeping call, so it is not long-running and gets
/// no `in-progress` trace entry before the call.
#[derive(Clone, Debug)]
pub struct InventoryClient {
    client: HttpAgentClient,
}

impl InventoryClient {
    /// Create a client against `base_url` with a bounded per-call timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpAgentClient::new(base_url, timeout),
        }
    }
}

#[async_trait]
impl AgentEndpoint for InventoryClient {
    type Request = InventoryRequest;
    type Response = InventoryResponse;

    fn agent_name(&self) -> AgentName {
        AgentName::Inventory
    }

    fn long_running(&self) -> bool {
        false
    }

    async fn call(&self, request: &Self::Request) -> AgentResult<Self::Response> {
        tracing::debug!(image_url = %request.image_url, "calling inventory");
        self.client.post_json("/confirm", request).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn is_not_long_running() {
        let client = InventoryClient::new("http://localhost:1", Duration::from_secs(1));
        assert!(!client.long_running());
        assert_eq!(client.agent_name(), AgentName::Inventory);
    }

    #[tokio::test]
    async fn confirm_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/confirm"))
            .and(body_json(serde_json::json!({
                "caption": "A one-of-a-kind stoneware mug.",
                "imageUrl": "https://cdn.example/enhanced.jpg"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Listing added to inventory"
            })))
            .mount(&server)
            .await;

        let client = InventoryClient::new(server.uri(), Duration::from_secs(5));
        let response = client
            .call(&InventoryRequest {
                caption: "A one-of-a-kind stoneware mug.".into(),
                image_url: "https://cdn.example/enhanced.jpg".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.message, "Listing added to inventory");
    }
}
