//! # Agent Endpoint Trait
//!
//! Core abstraction for external agent stages. Each stage (image
//! enhancement, marketing nudge, inventory) implements [`AgentEndpoint`]
//! with its own request/response payload types; the invoker in
//! `kiln-runtime` is generic over the trait.
//!
//! Exactly one underlying call is attempted per invocation — retries, if
//! any, belong to the message fabric redelivering the whole start event.

use std::time::Duration;

use async_trait::async_trait;
use kiln_core::AgentName;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::{AgentError, AgentResult};

/// One external agent stage.
///
/// Implementors must be `Send + Sync` for use across pipeline tasks.
#[async_trait]
pub trait AgentEndpoint: Send + Sync {
    /// Request payload type.
    type Request: Serialize + Send + Sync;
    /// Response payload type. `Serialize` so the invoker can attach it to
    /// the success trace entry.
    type Response: DeserializeOwned + Serialize + Send;

    /// Which logical stage this endpoint implements.
    fn agent_name(&self) -> AgentName;

    /// Whether this stage is long-running (seconds-scale).
    ///
    /// Long-running stages get an `in-progress` trace entry recorded before
    /// the call; fast stages record only their terminal entry.
    fn long_running(&self) -> bool {
        true
    }

    /// Make exactly one call to the endpoint.
    async fn call(&self, request: &Self::Request) -> AgentResult<Self::Response>;
}

/// Shared HTTP plumbing for the concrete endpoint clients.
///
/// POST JSON to `{base_url}{path}` with a bounded per-request timeout.
#[derive(Clone, Debug)]
pub struct HttpAgentClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAgentClient {
    /// Create a client for one endpoint base URL with a bounded timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `request` as JSON and decode the JSON response.
    pub async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> AgentResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(AgentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| self.map_send_error(e))
    }

    fn map_send_error(&self, err: reqwest::Error) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            AgentError::Http(err)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Serialize)]
    struct Ping {
        msg: String,
    }

    #[derive(Debug, Deserialize)]
    struct Pong {
        reply: String,
    }

    #[tokio::test]
    async fn post_json_roundtrip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(body_json(serde_json::json!({"msg": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "hello"
            })))
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(server.uri(), Duration::from_secs(5));
        let pong: Pong = client
            .post_json(
                "/echo",
                &Ping {
                    msg: "hi".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(pong.reply, "hello");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(server.uri(), Duration::from_secs(5));
        let err = client
            .post_json::<_, Pong>(
                "/echo",
                &Ping {
                    msg: "hi".into(),
                },
            )
            .await
            .unwrap_err();
        match err {
            AgentError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"reply": "late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(server.uri(), Duration::from_millis(50));
        let err = client
            .post_json::<_, Pong>(
                "/echo",
                &Ping {
                    msg: "hi".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got: {err:?}");
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "ok"
            })))
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(format!("{}/", server.uri()), Duration::from_secs(5));
        let pong: Pong = client
            .post_json(
                "/echo",
                &Ping {
                    msg: "hi".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(pong.reply, "ok");
    }
}
