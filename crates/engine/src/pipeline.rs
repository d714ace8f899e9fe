//! Per-item execution pipeline: validation, submission, polling.
//!
//! One invocation of `run_item` drives a single batch item to a terminal
//! outcome. The whole submit-then-poll attempt is wrapped by the retry
//! policy, so a retry re-submits the task rather than re-polling a dead
//! one. Retryability is decided here, not in the policy: transient
//! submission failures and poll timeouts are retried, everything else is
//! terminal.

use tokio::sync::broadcast;

use promptbatch_core::item::{FailureKind, ItemFailure, ItemId, TaskResult};
use promptbatch_core::parse;
use promptbatch_provider::{ProviderError, TaskService};

use crate::events::EngineEvent;
use crate::poll::{poll_until_terminal, PollConfig};
use crate::retry::{retry_with_backoff, RetryConfig};

/// Parameters for one item's execution pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Whole-pipeline retries after the first attempt.
    pub max_retries: u32,
    /// Backoff between pipeline attempts.
    pub retry: RetryConfig,
    /// Completion polling parameters.
    pub poll: PollConfig,
}

/// Terminal error of a pipeline attempt.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The request was malformed before submission. Never retried.
    #[error("{0}")]
    Validation(String),

    /// The create-task call failed.
    #[error("{0}")]
    Submission(#[from] ProviderError),

    /// The provider executed the task and reported failure.
    #[error("{0}")]
    Generation(String),

    /// Polling exhausted its attempt budget.
    #[error("polling abandoned after {attempts} attempts without a terminal status")]
    PollTimeout { attempts: u32 },
}

impl PipelineError {
    /// Whether a whole-pipeline retry can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Validation(_) => false,
            PipelineError::Submission(e) => e.is_retryable(),
            PipelineError::Generation(_) => false,
            PipelineError::PollTimeout { .. } => true,
        }
    }

    /// Classification tag recorded on the failed item.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Validation(_) => FailureKind::Validation,
            PipelineError::Submission(_) => FailureKind::Submission,
            PipelineError::Generation(_) => FailureKind::Generation,
            PipelineError::PollTimeout { .. } => FailureKind::PollTimeout,
        }
    }
}

impl From<PipelineError> for ItemFailure {
    fn from(error: PipelineError) -> Self {
        ItemFailure::new(error.kind(), error.to_string())
    }
}

/// Execute one item: validate, submit, poll to completion.
///
/// Transient failures are retried per `config`; the returned error is the
/// final attempt's, unchanged. Remote-call errors never escape as panics
/// or crashes -- the caller records the error on the item and moves on.
pub(crate) async fn run_item(
    service: &dyn TaskService,
    request: &serde_json::Value,
    config: &PipelineConfig,
    event_tx: &broadcast::Sender<EngineEvent>,
    item_id: ItemId,
    sequence_number: u32,
) -> Result<TaskResult, PipelineError> {
    // Validation happens once, before any submission, and is never retried.
    let prompt = parse::payload_prompt(request)
        .ok_or_else(|| PipelineError::Validation("Request payload has no prompt".to_string()))?;
    parse::validate_prompt(prompt).map_err(|e| PipelineError::Validation(e.to_string()))?;

    retry_with_backoff(
        config.max_retries,
        &config.retry,
        PipelineError::is_retryable,
        |attempt| {
            execute_attempt(
                service,
                request,
                &config.poll,
                event_tx,
                item_id,
                sequence_number,
                attempt,
            )
        },
    )
    .await
}

/// One submit-then-poll attempt.
async fn execute_attempt(
    service: &dyn TaskService,
    request: &serde_json::Value,
    poll: &PollConfig,
    event_tx: &broadcast::Sender<EngineEvent>,
    item_id: ItemId,
    sequence_number: u32,
    attempt: u32,
) -> Result<TaskResult, PipelineError> {
    if attempt > 0 {
        tracing::info!(sequence_number, attempt, "Re-submitting item");
    }

    let submitted = service.submit_task(request).await?;
    tracing::debug!(sequence_number, task_id = %submitted.task_id, "Task submitted");

    poll_until_terminal(
        service,
        &submitted.task_id,
        poll,
        event_tx,
        item_id,
        sequence_number,
    )
    .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
