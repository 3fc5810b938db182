//! Marketing nudge (caption generation) endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use kiln_core::AgentName;
use serde::{Deserialize, Serialize};

use crate::endpoint::{AgentEndpoint, HttpAgentClient};
use crate::errors::AgentResult;

/// Request to the marketing nudge service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    /// The seller's transcribed voice description.
    pub voice_input: String,
    /// URL of the enhanced product photo.
    pub image_url: String,
}

/// Response from the marketing nudge service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionResponse {
    /// Generated marketing caption for the listing.
    pub caption: String,
}

/// HTTP client for the marketing nudge stage.
#[derive(Clone, Debug)]
pub struct MarketingNudgeClient {
    client: HttpAgentClient,
}

impl MarketingNudgeClient {
    /// Create a client against `base_url` with a bounded per-call timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpAgentClient::new(base_url, timeout),
        }
    }
}

#[async_trait]
impl AgentEndpoint for MarketingNudgeClient {
    type Request = CaptionRequest;
    type Response = CaptionResponse;

    fn agent_name(&self) -> AgentName {
        AgentName::MarketingNudge
    }

    async fn call(&self, request: &Self::Request) -> AgentResult<Self::Response> {
        tracing::debug!(image_url = %request.image_url, "calling marketing nudge");
        self.client.post_json("/caption", request).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
