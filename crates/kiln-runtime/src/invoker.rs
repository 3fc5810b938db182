//! # Agent Invoker
//!
//! Wraps a single [`AgentEndpoint`] call with trace bracketing:
//!
//! 1. For long-running stages, record an `in-progress` entry carrying the
//!    request payload. This write must land before the call is attempted —
//!    if the store is down, the stage is never started.
//! 2. Make exactly one call.
//! 3. Record the terminal entry: `success` with the response payload, or
//!    `failure` with a description and category.
//!
//! Fast stages (inventory) skip step 1 and record only their terminal entry.

use kiln_agents::AgentEndpoint;
use kiln_core::TraceStatus;
use kiln_store::StoreError;
use serde_json::json;

use crate::errors::{PipelineError, PipelineResult};
use crate::recorder::TraceRecorder;

/// Invokes agent endpoints with durable trace bracketing.
#[derive(Clone, Debug)]
pub struct AgentInvoker {
    recorder: TraceRecorder,
}

impl AgentInvoker {
    /// Create an invoker recording through `recorder`.
    pub fn new(recorder: TraceRecorder) -> Self {
        Self { recorder }
    }

    /// Invoke `endpoint` once for `session_id`, recording progress and outcome.
    ///
    /// Returns [`PipelineError::Stage`] when the endpoint call fails; the
    /// failure entry has already been recorded by then. Store errors
    /// propagate as [`PipelineError::Store`] and abort the stage.
    pub async fn invoke<E: AgentEndpoint>(
        &self,
        session_id: &str,
        endpoint: &E,
        request: &E::Request,
    ) -> PipelineResult<E::Response> {
        let agent = endpoint.agent_name();

        if endpoint.long_running() {
            let payload = serde_json::to_value(request).map_err(StoreError::from)?;
            let _ = self
                .recorder
                .record(session_id, agent, TraceStatus::InProgress, &payload)?;
        }

        match endpoint.call(request).await {
            Ok(response) => {
                let payload = serde_json::to_value(&response).map_err(StoreError::from)?;
                let _ = self
                    .recorder
                    .record(session_id, agent, TraceStatus::Success, &payload)?;
                tracing::info!(session_id, agent = %agent, "stage succeeded");
                Ok(response)
            }
            Err(err) => {
                let message = err.to_string();
                let payload = json!({
                    "error": message,
                    "category": err.category(),
                });
                let _ = self
                    .recorder
                    .record(session_id, agent, TraceStatus::Failure, &payload)?;
                tracing::warn!(session_id, agent = %agent, error = %message, "stage failed");
                Err(PipelineError::Stage { agent, message })
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
