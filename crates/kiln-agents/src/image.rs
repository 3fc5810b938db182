//! Image enhancement endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use kiln_core::AgentName;
use serde::{Deserialize, Serialize};

use crate::endpoint::{AgentEndpoint, HttpAgentClient};
use crate::errors::AgentResult;

/// Request to the image enhancement service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    /// URL of the raw product photo to enhance.
    pub image_url: String,
}

/// Response from the image enhancement service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    /// URL of the enhanced product photo.
    pub enhanced_image_url: String,
}

/// HTTP client for the image enhancement stage.
///
/// Image enhancement is the slowest stage in the pipeline (model
/// inference), so callers should expect multi-second latencies up to the
/// configured timeout.
#[derive(Clone, Debug)]
pub struct ImageEnhancerClient {
    client: HttpAgentClient,
}

impl ImageEnhancerClient {
    /// Create a client against `base_url` with a bounded per-call timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpAgentClient::new(base_url, timeout),
        }
    }
}

#[async_trait]
impl AgentEndpoint for ImageEnhancerClient {
    type Request = EnhanceRequest;
    type Response = EnhanceResponse;

    fn agent_name(&self) -> AgentName {
        AgentName::ImageEnhancer
    }

    async fn call(&self, request: &Self::Request) -> AgentResult<Self::Response> {
        tracing::debug!(image_url = %request.image_url, "calling image enhancer");
        self.client.post_json("/enhance", request).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::errors::AgentError;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn is_long_running() {
        let client = ImageEnhancerClient::new("http://localhost:1", Duration::from_secs(1));
        assert!(client.long_running());
        assert_eq!(client.agent_name(), AgentName::ImageEnhancer);
    }

    #[tokio::test]
    async fn enhance_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/enhance"))
            .and(body_json(serde_json::json!({
                "imageUrl": "https://cdn.example/raw.jpg"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "enhancedImageUrl": "https://cdn.example/enhanced.jpg"
            })))
            .mount(&server)
            .await;

        let client = ImageEnhancerClient::new(server.uri(), Duration::from_secs(5));
        let response = client
            .call(&EnhanceRequest {
                image_url: "https://cdn.example/raw.jpg".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.enhanced_image_url, "https://cdn.example/enhanced.jpg");
    }

    #[tokio::test]
    async fn enhance_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/enhance"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"enhancedImageUrl": "x"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = ImageEnhancerClient::new(server.uri(), Duration::from_millis(50));
        let err = client
            .call(&EnhanceRequest {
                image_url: "https://cdn.example/raw.jpg".into(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, AgentError::Timeout { timeout_ms: 50 });
    }
}
