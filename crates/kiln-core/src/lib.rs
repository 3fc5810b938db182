//! # kiln-core
//!
//! Shared vocabulary for the Kiln listing workflow orchestrator:
//!
//! - **Agent names**: the fixed pipeline stages, their display names and step slugs
//! - **Status enums**: session lifecycle and trace-entry statuses with wire names
//! - **Branded IDs**: `SessionId` newtype (UUID v7, `sess_` prefix)
//! - **Start event**: the orchestration-start message shape and its validation

#![deny(unsafe_code)]

pub mod agent;
pub mod ids;
pub mod start;
pub mod status;

pub use agent::AgentName;
pub use ids::SessionId;
pub use start::{InputData, StartEvent, ValidationError};
pub use status::{SessionStatus, TraceStatus};
