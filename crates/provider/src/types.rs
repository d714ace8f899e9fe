//! Wire types for the provider task API.

use serde::{Deserialize, Serialize};

/// Remote status of an asynchronous generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteTaskStatus {
    /// Accepted but not yet picked up by a worker.
    Queued,
    /// Generation is underway.
    Running,
    /// Generation finished; `result` is populated.
    Succeeded,
    /// Generation failed; `error` is populated.
    Failed,
}

impl RemoteTaskStatus {
    /// Whether the remote task has reached a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Response returned by the create-task endpoint after successfully
/// queuing a generation task.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the queued task.
    pub task_id: String,
}

/// Response returned by the get-task endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    /// Current remote status.
    pub status: RemoteTaskStatus,
    /// Output data, present once the task has succeeded.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Failure description, present once the task has failed.
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!RemoteTaskStatus::Queued.is_terminal());
        assert!(!RemoteTaskStatus::Running.is_terminal());
        assert!(RemoteTaskStatus::Succeeded.is_terminal());
        assert!(RemoteTaskStatus::Failed.is_terminal());
    }

    #[test]
    fn status_parses_from_snake_case() {
        let status: RemoteTaskStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, RemoteTaskStatus::Running);
    }

    #[test]
    fn status_response_optional_fields_default_to_none() {
        let response: TaskStatusResponse =
            serde_json::from_str(r#"{"status": "queued"}"#).unwrap();
        assert_eq!(response.status, RemoteTaskStatus::Queued);
        assert!(response.result.is_none());
        assert!(response.error.is_none());
    }

    #[test]
    fn status_response_carries_result() {
        let response: TaskStatusResponse = serde_json::from_str(
            r#"{"status": "succeeded", "result": {"images": ["a.png"]}}"#,
        )
        .unwrap();
        assert_eq!(response.status, RemoteTaskStatus::Succeeded);
        assert_eq!(response.result.unwrap()["images"][0], "a.png");
    }

    #[test]
    fn submit_response_parses_task_id() {
        let response: SubmitResponse = serde_json::from_str(r#"{"task_id": "t-123"}"#).unwrap();
        assert_eq!(response.task_id, "t-123");
    }
}
