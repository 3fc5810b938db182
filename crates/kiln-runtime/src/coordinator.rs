//! # Workflow Coordinator
//!
//! Drives one session through the listing pipeline:
//!
//! ```text
//! started ──claim──▶ in-progress ──▶ voice ──▶ enhance ──▶ caption ──▶ inventory ──▶ completed
//!                                      │          │           │            │
//!                                      └──────────┴───────────┴────────────┴──▶ failed
//! ```
//!
//! The claim is an atomic compare-and-set on the session status, so a
//! redelivered start event for a session that is already running (or
//! finished) is skipped without touching the trace. Stage failures stop the
//! pipeline: the coordinator records an orchestrator `failure` entry, marks
//! the session `failed`, and reports [`RunOutcome::Failed`] — that is a
//! handled outcome, not an error. Only validation and storage problems
//! surface as `Err`.

use std::sync::Arc;

use kiln_agents::{
    AgentEndpoint, CaptionRequest, CaptionResponse, EnhanceRequest, EnhanceResponse,
    InventoryRequest, InventoryResponse,
};
use kiln_core::{AgentName, SessionStatus, StartEvent, TraceStatus};
use kiln_store::SessionStore;
use serde::Serialize;
use serde_json::json;

use crate::errors::{PipelineError, PipelineResult};
use crate::invoker::AgentInvoker;
use crate::recorder::TraceRecorder;

/// How one start-event delivery was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The pipeline ran to completion.
    Completed,
    /// A stage failed; the session is marked `failed`.
    Failed,
    /// The session was not startable (already claimed or finished).
    Skipped,
}

/// The assembled listing produced by a successful pipeline run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedListing {
    /// URL of the enhanced product photo.
    pub enhanced_image_url: String,
    /// Generated marketing caption.
    pub caption: String,
    /// Inventory confirmation message.
    pub confirmation: String,
}

/// Coordinates the fixed agent pipeline for one session at a time.
///
/// Generic over the three endpoint handles so tests can inject stubs; the
/// request/response payloads are pinned to the pipeline's wire types.
#[derive(Debug)]
pub struct WorkflowCoordinator<E, C, I>
where
    E: AgentEndpoint<Request = EnhanceRequest, Response = EnhanceResponse>,
    C: AgentEndpoint<Request = CaptionRequest, Response = CaptionResponse>,
    I: AgentEndpoint<Request = InventoryRequest, Response = InventoryResponse>,
{
    store: Arc<SessionStore>,
    recorder: TraceRecorder,
    invoker: AgentInvoker,
    enhancer: E,
    nudge: C,
    inventory: I,
}

impl<E, C, I> WorkflowCoordinator<E, C, I>
where
    E: AgentEndpoint<Request = EnhanceRequest, Response = EnhanceResponse>,
    C: AgentEndpoint<Request = CaptionRequest, Response = CaptionResponse>,
    I: AgentEndpoint<Request = InventoryRequest, Response = InventoryResponse>,
{
    /// Create a coordinator over the store and the three endpoint handles.
    pub fn new(store: Arc<SessionStore>, enhancer: E, nudge: C, inventory: I) -> Self {
        let recorder = TraceRecorder::new(Arc::clone(&store));
        let invoker = AgentInvoker::new(recorder.clone());
        Self {
            store,
            recorder,
            invoker,
            enhancer,
            nudge,
            inventory,
        }
    }

    /// Handle one start-event delivery end to end.
    ///
    /// Idempotent under redelivery: the session must exist and be in
    /// `started` status to be claimed; anything else is [`RunOutcome::Skipped`].
    pub async fn run(&self, event: &StartEvent) -> PipelineResult<RunOutcome> {
        event.validate()?;
        let session_id = &event.session_id;

        // Missing sessions are an error; unstartable ones are a skip.
        let _ = self.store.get_session(session_id)?;
        if !self.store.claim(session_id)? {
            tracing::info!(session_id, "session not startable, skipping delivery");
            return Ok(RunOutcome::Skipped);
        }

        match self.run_pipeline(event).await {
            Ok(listing) => {
                let _ = self.recorder.record(
                    session_id,
                    AgentName::Orchestrator,
                    TraceStatus::Completed,
                    &json!({
                        "enhancedImageUrl": listing.enhanced_image_url,
                        "caption": listing.caption,
                    }),
                )?;
                self.store.set_status(session_id, SessionStatus::Completed)?;
                tracing::info!(session_id, "pipeline completed");
                Ok(RunOutcome::Completed)
            }
            Err(PipelineError::Stage { agent, message }) => {
                let _ = self.recorder.record(
                    session_id,
                    AgentName::Orchestrator,
                    TraceStatus::Failure,
                    &json!({
                        "failedAgent": agent.as_str(),
                        "error": message,
                    }),
                )?;
                self.store.set_status(session_id, SessionStatus::Failed)?;
                tracing::warn!(session_id, agent = %agent, error = %message, "pipeline failed");
                Ok(RunOutcome::Failed)
            }
            Err(other) => Err(other),
        }
    }

    async fn run_pipeline(&self, event: &StartEvent) -> PipelineResult<FinishedListing> {
        let session_id = &event.session_id;
        let input = &event.input_data;

        let _ = self.recorder.record(
            session_id,
            AgentName::Orchestrator,
            TraceStatus::Started,
            &json!({"inputData": input}),
        )?;

        // Voice is a local stage: the transcript was validated with the
        // start event, so it goes straight to its terminal entry.
        let _ = self.recorder.record(
            session_id,
            AgentName::Voice,
            TraceStatus::Success,
            &json!({"transcript": input.voice_input}),
        )?;

        let enhanced = self
            .invoker
            .invoke(
                session_id,
                &self.enhancer,
                &EnhanceRequest {
                    image_url: input.image_url.clone(),
                },
            )
            .await?;

        let captioned = self
            .invoker
            .invoke(
                session_id,
                &self.nudge,
                &CaptionRequest {
                    voice_input: input.voice_input.clone(),
                    image_url: enhanced.enhanced_image_url.clone(),
                },
            )
            .await?;

        let confirmed = self
            .invoker
            .invoke(
                session_id,
                &self.inventory,
                &InventoryRequest {
                    caption: captioned.caption.clone(),
                    image_url: enhanced.enhanced_image_url.clone(),
                },
            )
            .await?;

        Ok(FinishedListing {
            enhanced_image_url: enhanced.enhanced_image_url,
            caption: captioned.caption,
            confirmation: confirmed.message,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
