//! The collaborator seam between the orchestrator and a provider.

use async_trait::async_trait;

use crate::api::{ProviderApi, ProviderError};
use crate::types::{SubmitResponse, TaskStatusResponse};

/// Asynchronous task service exposed by a generation provider.
///
/// The engine drives batches exclusively through this trait, so tests can
/// substitute a scripted implementation and alternative transports can be
/// added without touching the scheduler.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Create a task; returns the opaque remote task identifier.
    async fn submit_task(
        &self,
        payload: &serde_json::Value,
    ) -> Result<SubmitResponse, ProviderError>;

    /// Fetch the current status of a previously submitted task.
    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ProviderError>;
}

#[async_trait]
impl TaskService for ProviderApi {
    async fn submit_task(
        &self,
        payload: &serde_json::Value,
    ) -> Result<SubmitResponse, ProviderError> {
        ProviderApi::submit_task(self, payload).await
    }

    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ProviderError> {
        ProviderApi::get_task_status(self, task_id).await
    }
}
