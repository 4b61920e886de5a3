//! Workflow runner integration.
//!
//! Agent workflows are hosted by an external runner; the marketplace only
//! holds a request/response contract with it. Dispatch posts the invocation
//! to the agent's webhook, results are fetched back by run ID.

pub mod client;
pub mod types;

pub use client::{RunnerClient, RunnerError};
pub use types::{DispatchRequest, DispatchResponse, RunResult, RunStatus};
