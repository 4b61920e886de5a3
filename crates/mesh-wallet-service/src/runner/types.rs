//! Workflow runner API types.

use serde::{Deserialize, Serialize};

/// Invocation payload posted to an agent's webhook.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRequest {
    /// The invoking user.
    pub user_id: String,

    /// The wallet transaction that paid for this run. The runner treats it
    /// as an idempotency reference: re-posting the same transaction must not
    /// start a second run.
    pub transaction_id: String,

    /// Agent-specific input.
    pub input: serde_json::Value,
}

/// Runner acknowledgement for a dispatched invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchResponse {
    /// Run identifier assigned by the runner.
    pub run_id: String,

    /// Initial run status.
    #[serde(default)]
    pub status: RunStatus,
}

/// Status of a dispatched run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Accepted, not started yet.
    #[default]
    Queued,

    /// Currently executing.
    Running,

    /// Finished successfully; results are available.
    Completed,

    /// Finished with an error.
    Failed,
}

/// Run results fetched from the runner.
///
/// The runner stores results row-oriented (the original deployment wrote
/// them to a spreadsheet), so the result is a list of JSON rows.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunResult {
    /// Run identifier.
    pub run_id: String,

    /// Current status.
    pub status: RunStatus,

    /// Result rows, empty until the run completes.
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,

    /// Error message for failed runs.
    #[serde(default)]
    pub error: Option<String>,
}

/// Runner error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerErrorResponse {
    /// Error message.
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_response_defaults_to_queued() {
        let response: DispatchResponse =
            serde_json::from_str(r#"{"run_id": "run_123"}"#).unwrap();
        assert_eq!(response.status, RunStatus::Queued);
    }

    #[test]
    fn run_result_rows_default_empty() {
        let result: RunResult =
            serde_json::from_str(r#"{"run_id": "run_123", "status": "running"}"#).unwrap();
        assert!(result.rows.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn run_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Completed).unwrap(),
            "\"completed\""
        );
        let status: RunStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, RunStatus::Failed);
    }
}
