//! The orchestration-start message and its validation.
//!
//! Wire shape (camelCase JSON, matching the fabric contract):
//!
//! `{"sessionId": "...", "inputData": {"voiceInput": "...", "imageUrl": "..."}}`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-supplied input payload for a session. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
    /// Raw voice transcript describing the item to list.
    pub voice_input: String,
    /// Reference to the source image to enhance.
    pub image_url: String,
}

/// One orchestration-start message, delivered at-least-once by the fabric.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEvent {
    /// Session this message starts orchestration for.
    pub session_id: String,
    /// The session's input payload.
    pub input_data: InputData,
}

/// A start event failed validation. Nothing is recorded for such messages;
/// they are rejected/dead-lettered by the consumer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl StartEvent {
    /// Check that all required fields are present and non-empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_id.trim().is_empty() {
            return Err(ValidationError::MissingField("sessionId"));
        }
        if self.input_data.voice_input.trim().is_empty() {
            return Err(ValidationError::MissingField("inputData.voiceInput"));
        }
        if self.input_data.image_url.trim().is_empty() {
            return Err(ValidationError::MissingField("inputData.imageUrl"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_event() -> StartEvent {
        StartEvent {
            session_id: "s1".into(),
            input_data: InputData {
                voice_input: "I want a blue ceramic bowl".into(),
                image_url: "img://raw/1".into(),
            },
        }
    }

    #[test]
    fn valid_event_passes() {
        assert_eq!(valid_event().validate(), Ok(()));
    }

    #[test]
    fn empty_session_id_rejected() {
        let mut event = valid_event();
        event.session_id = "  ".into();
        assert_eq!(
            event.validate(),
            Err(ValidationError::MissingField("sessionId"))
        );
    }

    #[test]
    fn empty_voice_input_rejected() {
        let mut event = valid_event();
        event.input_data.voice_input = String::new();
        assert_eq!(
            event.validate(),
            Err(ValidationError::MissingField("inputData.voiceInput"))
        );
    }

    #[test]
    fn empty_image_url_rejected() {
        let mut event = valid_event();
        event.input_data.image_url = String::new();
        assert_eq!(
            event.validate(),
            Err(ValidationError::MissingField("inputData.imageUrl"))
        );
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let json = serde_json::to_value(valid_event()).unwrap();
        assert!(json.get("sessionId").is_some());
        assert!(json["inputData"].get("voiceInput").is_some());
        assert!(json["inputData"].get("imageUrl").is_some());
    }

    #[test]
    fn deserializes_fabric_message() {
        let event: StartEvent = serde_json::from_str(
            r#"{"sessionId":"s1","inputData":{"voiceInput":"a vase","imageUrl":"img://raw/9"}}"#,
        )
        .unwrap();
        assert_eq!(event.session_id, "s1");
        assert_eq!(event.input_data.image_url, "img://raw/9");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::MissingField("sessionId");
        assert_eq!(err.to_string(), "missing required field: sessionId");
    }
}
