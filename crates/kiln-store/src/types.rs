//! Row types and operation options for the session store.

use kiln_core::{SessionStatus, TraceStatus};
use serde::Serialize;
use serde_json::Value;

/// One session record, as stored.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    /// Session identifier (`sess_{uuidv7}` or caller-supplied).
    pub id: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Raw voice transcript from the start payload.
    pub voice_input: String,
    /// Source image reference from the start payload.
    pub image_url: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Number of metered pipeline stages, fixed at creation.
    pub total_agents: i64,
    /// Stages that reached a success terminal status.
    pub completed_agents: i64,
    /// Stages that reached a failure terminal status.
    pub errors: i64,
}

/// One trace entry, as stored.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRow {
    /// Owning session.
    pub session_id: String,
    /// Step identifier, unique within the session.
    pub step_id: String,
    /// Display name of the producing agent.
    pub agent_name: String,
    /// Current status of the step.
    pub status: TraceStatus,
    /// Stage-specific payload, opaque to the store.
    pub data: Value,
    /// Creation timestamp (RFC 3339). Preserved across merge-updates.
    pub timestamp: String,
    /// Per-session insertion sequence; breaks timestamp ties.
    pub seq: i64,
    /// Timestamp of the last merge-update, if any.
    pub updated_at: Option<String>,
}

/// Options for creating a session.
#[derive(Debug)]
pub struct CreateSessionOptions<'a> {
    /// Explicit session id; a `sess_` id is generated when `None`.
    pub session_id: Option<&'a str>,
    /// Raw voice transcript.
    pub voice_input: &'a str,
    /// Source image reference.
    pub image_url: &'a str,
    /// Metered stage count; defaults to [`kiln_core::agent::PIPELINE_TOTAL_AGENTS`].
    pub total_agents: Option<i64>,
}

/// Options for recording (append-or-upsert) one trace step.
#[derive(Debug)]
pub struct RecordStepOptions<'a> {
    /// Owning session; must exist.
    pub session_id: &'a str,
    /// Step identifier. Appends when unseen, merge-updates when seen.
    pub step_id: &'a str,
    /// Display name of the producing agent.
    pub agent_name: &'a str,
    /// Status to record.
    pub status: TraceStatus,
    /// Stage-specific payload; shallow-merged into existing data on update.
    pub data: &'a Value,
}

/// Result of a trace recording, with enough context for exactly-once rollup.
#[derive(Clone, Debug)]
pub struct StepRecorded {
    /// The step row after the write.
    pub row: TraceRow,
    /// `true` if a new entry was appended, `false` if an existing one merged.
    pub appended: bool,
    /// The step's status before the write (`None` when appended).
    pub prior_status: Option<TraceStatus>,
}

/// Increments to apply to a session's metric counters.
///
/// Applied as atomic SQL increments, never read-modify-write. Fields left at
/// zero are untouched (merge semantics).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsDelta {
    /// Amount to add to `completedAgents`.
    pub completed_agents: i64,
    /// Amount to add to `errors`.
    pub errors: i64,
}

impl MetricsDelta {
    /// Whether applying this delta would change nothing.
    pub fn is_empty(&self) -> bool {
        self.completed_agents == 0 && self.errors == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
