//! # kiln-agents
//!
//! Request/response clients for the external agent stages:
//!
//! - **Endpoint trait**: [`AgentEndpoint`] — one call per invocation, typed
//!   request/response payloads, bounded timeout
//! - **Concrete clients**: image enhancement, marketing nudge (caption),
//!   inventory confirmation — HTTP POST JSON via `reqwest`
//!
//! The invoker in `kiln-runtime` wraps these with trace bracketing; this
//! crate knows nothing about sessions or the store.

#![deny(unsafe_code)]

pub mod caption;
pub mod endpoint;
pub mod errors;
pub mod image;
pub mod inventory;

pub use caption::{CaptionRequest, CaptionResponse, MarketingNudgeClient};
pub use endpoint::{AgentEndpoint, HttpAgentClient};
pub use errors::{AgentError, AgentResult};
pub use image::{EnhanceRequest, EnhanceResponse, ImageEnhancerClient};
pub use inventory::{InventoryClient, InventoryRequest, InventoryResponse};
