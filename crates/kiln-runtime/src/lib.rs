//! # kiln-runtime
//!
//! The orchestration core of the listing pipeline:
//!
//! - **Trace recorder**: single write path for trace entries and the
//!   `completedAgents`/`errors` rollup, idempotent under redelivery
//! - **Agent invoker**: brackets each endpoint call with durable
//!   in-progress/terminal trace entries
//! - **Workflow coordinator**: the session state machine, from claim to
//!   `completed`/`failed`
//! - **Start-event consumer**: pull loop over fabric deliveries with
//!   per-delivery acks and graceful drain
//! - **Session query service**: read side for sessions and progress

#![deny(unsafe_code)]

pub mod consumer;
pub mod coordinator;
pub mod errors;
pub mod invoker;
pub mod query;
pub mod recorder;

pub use consumer::{DeliveryOutcome, StartDelivery, StartEventConsumer};
pub use coordinator::{FinishedListing, RunOutcome, WorkflowCoordinator};
pub use errors::{PipelineError, PipelineResult};
pub use invoker::AgentInvoker;
pub use query::{SessionProgress, SessionQueryService};
pub use recorder::TraceRecorder;
