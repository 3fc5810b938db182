//! # Start-Event Consumer
//!
//! Pull-based loop over a channel of start-event deliveries. Each delivery
//! is handled on its own task so a slow pipeline does not block the next
//! session; the fabric's acknowledgement travels back through an optional
//! per-delivery oneshot.
//!
//! Outcome mapping:
//!
//! - coordinator `Ok` (completed, failed, skipped) → acknowledged; the
//!   outcome is durable either way and the message must not be redelivered
//! - validation errors → rejected (dead-letter; a malformed message never
//!   becomes valid)
//! - store errors, including session-not-found → retry (transient, or the
//!   session row has not landed yet)

use std::sync::Arc;

use kiln_agents::{
    AgentEndpoint, CaptionRequest, CaptionResponse, EnhanceRequest, EnhanceResponse,
    InventoryRequest, InventoryResponse,
};
use kiln_core::StartEvent;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::coordinator::{RunOutcome, WorkflowCoordinator};
use crate::errors::PipelineError;

/// How a single delivery was resolved, reported back to the fabric.
#[derive(Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Processed; the message must not be redelivered.
    Acked(RunOutcome),
    /// Permanently unprocessable; dead-letter it.
    Rejected(String),
    /// Transient failure; redeliver later.
    Retry(String),
}

/// One start-event delivery from the message fabric.
#[derive(Debug)]
pub struct StartDelivery {
    /// The decoded start event.
    pub event: StartEvent,
    /// Ack handle; `None` for fire-and-forget sources.
    pub ack: Option<oneshot::Sender<DeliveryOutcome>>,
}

/// Pulls start-event deliveries and dispatches them to the coordinator.
pub struct StartEventConsumer<E, C, I>
where
    E: AgentEndpoint<Request = EnhanceRequest, Response = EnhanceResponse>,
    C: AgentEndpoint<Request = CaptionRequest, Response = CaptionResponse>,
    I: AgentEndpoint<Request = InventoryRequest, Response = InventoryResponse>,
{
    coordinator: Arc<WorkflowCoordinator<E, C, I>>,
    deliveries: mpsc::Receiver<StartDelivery>,
    shutdown: CancellationToken,
}

impl<E, C, I> StartEventConsumer<E, C, I>
where
    E: AgentEndpoint<Request = EnhanceRequest, Response = EnhanceResponse> + 'static,
    C: AgentEndpoint<Request = CaptionRequest, Response = CaptionResponse> + 'static,
    I: AgentEndpoint<Request = InventoryRequest, Response = InventoryResponse> + 'static,
{
    /// Create a consumer over a delivery channel and a shutdown token.
    pub fn new(
        coordinator: Arc<WorkflowCoordinator<E, C, I>>,
        deliveries: mpsc::Receiver<StartDelivery>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            coordinator,
            deliveries,
            shutdown,
        }
    }

    /// Run until the channel closes or shutdown is signalled.
    ///
    /// In-flight sessions are drained before returning so a graceful
    /// shutdown never abandons a half-recorded pipeline.
    pub async fn run(mut self) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    tracing::info!("shutdown signalled, draining in-flight sessions");
                    break;
                }
                maybe = self.deliveries.recv() => {
                    let Some(delivery) = maybe else {
                        tracing::info!("delivery channel closed");
                        break;
                    };
                    let coordinator = Arc::clone(&self.coordinator);
                    let _ = in_flight.spawn(async move {
                        Self::process(&coordinator, delivery).await;
                    });
                }
            }
        }

        while in_flight.join_next().await.is_some() {}
    }

    async fn process(coordinator: &WorkflowCoordinator<E, C, I>, delivery: StartDelivery) {
        let session_id = delivery.event.session_id.clone();
        let outcome = match coordinator.run(&delivery.event).await {
            Ok(run) => DeliveryOutcome::Acked(run),
            Err(PipelineError::Validation(err)) => {
                tracing::warn!(session_id, error = %err, "rejecting invalid start event");
                DeliveryOutcome::Rejected(err.to_string())
            }
            Err(err) => {
                tracing::error!(session_id, error = %err, "delivery failed, requesting retry");
                DeliveryOutcome::Retry(err.to_string())
            }
        };

        if let Some(ack) = delivery.ack
            && ack.send(outcome).is_err()
        {
            tracing::debug!(session_id, "ack receiver dropped");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
