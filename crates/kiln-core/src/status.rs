//! Session lifecycle and trace-entry statuses.
//!
//! Wire names are the lowercase/kebab strings used in both the JSON payloads
//! and the store's TEXT columns. `success`/`done` are synonyms for a
//! completed stage; `failure`/`error` are synonyms for a failed stage — the
//! metrics rollup treats each pair identically.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a session record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    /// Created, orchestration not yet begun.
    Started,
    /// Claimed by a coordinator; pipeline running.
    InProgress,
    /// Pipeline finished successfully. Terminal.
    Completed,
    /// Pipeline failed. Terminal.
    Failed,
}

impl SessionStatus {
    /// Wire/storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse from the wire/storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "started" => Some(Self::Started),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether no further transitions occur for this session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status carried by a single trace entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceStatus {
    // ── Orchestrator lifecycle ──
    /// Pipeline consumed a start event.
    Started,
    /// Pipeline reached its success terminal state.
    Completed,

    // ── Stage progress ──
    /// Stage queued but not yet attempted.
    Pending,
    /// Stage attempt underway.
    InProgress,

    // ── Stage terminal (success pair) ──
    /// Stage finished successfully.
    Success,
    /// Synonym for [`TraceStatus::Success`].
    Done,

    // ── Stage terminal (failure pair) ──
    /// Stage failed.
    Failure,
    /// Synonym for [`TraceStatus::Failure`].
    Error,
}

impl TraceStatus {
    /// Wire/storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Success => "success",
            Self::Done => "done",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }

    /// Parse from the wire/storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "started" => Some(Self::Started),
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "in-progress" => Some(Self::InProgress),
            "success" => Some(Self::Success),
            "done" => Some(Self::Done),
            "failure" => Some(Self::Failure),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether this status marks a successfully completed stage.
    pub fn is_stage_success(self) -> bool {
        matches!(self, Self::Success | Self::Done)
    }

    /// Whether this status marks a failed stage.
    pub fn is_stage_failure(self) -> bool {
        matches!(self, Self::Failure | Self::Error)
    }

    /// Whether this status is terminal for a stage (either pair).
    pub fn is_stage_terminal(self) -> bool {
        self.is_stage_success() || self.is_stage_failure()
    }
}

impl std::fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── SessionStatus ──

    #[test]
    fn session_status_wire_names() {
        assert_eq!(SessionStatus::Started.as_str(), "started");
        assert_eq!(SessionStatus::InProgress.as_str(), "in-progress");
        assert_eq!(SessionStatus::Completed.as_str(), "completed");
        assert_eq!(SessionStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn session_status_parse_roundtrip() {
        for status in [
            SessionStatus::Started,
            SessionStatus::InProgress,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("bogus"), None);
    }

    #[test]
    fn session_status_terminality() {
        assert!(!SessionStatus::Started.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
    }

    #[test]
    fn session_status_serde_matches_as_str() {
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    // ── TraceStatus ──

    #[test]
    fn trace_status_wire_names() {
        assert_eq!(TraceStatus::InProgress.as_str(), "in-progress");
        assert_eq!(TraceStatus::Success.as_str(), "success");
        assert_eq!(TraceStatus::Failure.as_str(), "failure");
    }

    #[test]
    fn trace_status_parse_roundtrip() {
        for status in [
            TraceStatus::Started,
            TraceStatus::Completed,
            TraceStatus::Pending,
            TraceStatus::InProgress,
            TraceStatus::Success,
            TraceStatus::Done,
            TraceStatus::Failure,
            TraceStatus::Error,
        ] {
            assert_eq!(TraceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TraceStatus::parse(""), None);
    }

    #[test]
    fn success_and_done_are_synonyms() {
        assert!(TraceStatus::Success.is_stage_success());
        assert!(TraceStatus::Done.is_stage_success());
        assert!(!TraceStatus::Success.is_stage_failure());
    }

    #[test]
    fn failure_and_error_are_synonyms() {
        assert!(TraceStatus::Failure.is_stage_failure());
        assert!(TraceStatus::Error.is_stage_failure());
        assert!(!TraceStatus::Error.is_stage_success());
    }

    #[test]
    fn progress_statuses_are_not_terminal() {
        assert!(!TraceStatus::Pending.is_stage_terminal());
        assert!(!TraceStatus::InProgress.is_stage_terminal());
        assert!(!TraceStatus::Started.is_stage_terminal());
        assert!(!TraceStatus::Completed.is_stage_terminal());
    }

    #[test]
    fn stage_terminal_covers_both_pairs() {
        assert!(TraceStatus::Success.is_stage_terminal());
        assert!(TraceStatus::Done.is_stage_terminal());
        assert!(TraceStatus::Failure.is_stage_terminal());
        assert!(TraceStatus::Error.is_stage_terminal());
    }

    #[test]
    fn trace_status_serde_matches_as_str() {
        let json = serde_json::to_string(&TraceStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: TraceStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(back, TraceStatus::Done);
    }
}
