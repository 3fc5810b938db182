//! # Trace Recorder
//!
//! Single write path for trace entries and the metrics rollup. Every record
//! goes through one of two doors:
//!
//! - [`TraceRecorder::record`] — coordinator-generated steps. The step id is
//!   derived from the agent slug and status (`image-enhancer-in-progress`),
//!   so each status of a stage is its own trace entry while redeliveries of
//!   the same status merge into the existing one.
//! - [`TraceRecorder::record_external`] — gateway-driven records with a
//!   caller-supplied step id and agent label.
//!
//! Both apply the same rollup policy: `completedAgents`/`errors` increment
//! exactly when a metered step *enters* a terminal status. A merge into an
//! already-terminal step (a redelivered message) changes nothing, which keeps
//! the counters idempotent under at-least-once delivery.

use std::sync::Arc;

use kiln_core::{AgentName, TraceStatus};
use kiln_store::{MetricsDelta, RecordStepOptions, SessionStore, StepRecorded, StoreError};
use serde_json::Value;

/// Records trace entries and keeps session metric counters in sync.
#[derive(Clone, Debug)]
pub struct TraceRecorder {
    store: Arc<SessionStore>,
}

impl TraceRecorder {
    /// Create a recorder over the given store.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Record a coordinator-generated step for `agent` at `status`.
    pub fn record(
        &self,
        session_id: &str,
        agent: AgentName,
        status: TraceStatus,
        data: &Value,
    ) -> Result<StepRecorded, StoreError> {
        let step_id = format!("{}-{}", agent.slug(), status.as_str());
        let recorded = self.store.record_step(&RecordStepOptions {
            session_id,
            step_id: &step_id,
            agent_name: agent.as_str(),
            status,
            data,
        })?;
        self.apply_rollup(session_id, agent.is_metered(), &recorded)?;
        Ok(recorded)
    }

    /// Record a step with a caller-supplied id and agent label.
    ///
    /// Used for records arriving from outside the coordinator (a gateway
    /// progress update). Labels matching the orchestrator display name are
    /// excluded from the rollup like coordinator orchestrator steps.
    pub fn record_external(
        &self,
        session_id: &str,
        step_id: &str,
        agent_label: &str,
        status: TraceStatus,
        data: &Value,
    ) -> Result<StepRecorded, StoreError> {
        let recorded = self.store.record_step(&RecordStepOptions {
            session_id,
            step_id,
            agent_name: agent_label,
            status,
            data,
        })?;
        let metered = agent_label != AgentName::Orchestrator.as_str();
        self.apply_rollup(session_id, metered, &recorded)?;
        Ok(recorded)
    }

    fn apply_rollup(
        &self,
        session_id: &str,
        metered: bool,
        recorded: &StepRecorded,
    ) -> Result<(), StoreError> {
        let delta = Self::rollup_delta(metered, recorded);
        if delta.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            session_id,
            step_id = %recorded.row.step_id,
            completed = delta.completed_agents,
            errors = delta.errors,
            "applying metrics rollup"
        );
        self.store.update_metrics(session_id, &delta)
    }

    /// The counter delta for one recorded step.
    ///
    /// Nonzero only when a metered step entered a terminal status with this
    /// write: either a fresh append, or a merge that moved a non-terminal
    /// step to a terminal one.
    fn rollup_delta(metered: bool, recorded: &StepRecorded) -> MetricsDelta {
        let status = recorded.row.status;
        if !metered || !status.is_stage_terminal() {
            return MetricsDelta::default();
        }
        let entered_terminal = match recorded.prior_status {
            None => true,
            Some(prior) => !prior.is_stage_terminal(),
        };
        if !entered_terminal {
            return MetricsDelta::default();
        }
        if status.is_stage_success() {
            MetricsDelta {
                completed_agents: 1,
                errors: 0,
            }
        } else {
            MetricsDelta {
                completed_agents: 0,
                errors: 1,
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
