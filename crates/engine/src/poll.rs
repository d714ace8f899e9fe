//! Fixed-interval completion polling.
//!
//! A submitted task is polled until the provider reports a terminal status
//! or the attempt budget runs out. Each non-terminal poll surfaces an
//! [`EngineEvent::ItemProgress`] tick so observers can render intermediate
//! state long before the item settles.

use std::time::Duration;

use tokio::sync::broadcast;

use promptbatch_core::item::{ItemId, TaskResult};
use promptbatch_core::progress::{poll_fraction, POLL_PROGRESS_CAP};
use promptbatch_provider::{RemoteTaskStatus, TaskService};

use crate::events::EngineEvent;
use crate::pipeline::PipelineError;

/// Tunable parameters for the polling protocol.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive status requests.
    pub interval: Duration,
    /// Polls to attempt before abandoning the task as timed out.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            // 5 minutes at the default interval.
            max_attempts: 150,
        }
    }
}

/// Poll `task_id` until it reaches a terminal status.
///
/// Returns the task's result on `succeeded`, a
/// [`PipelineError::Generation`] on `failed`, and
/// [`PipelineError::PollTimeout`] once `max_attempts` polls have passed
/// without a terminal status. Transport errors on individual polls are
/// logged and consume an attempt; the budget bounds the total wait.
pub(crate) async fn poll_until_terminal(
    service: &dyn TaskService,
    task_id: &str,
    config: &PollConfig,
    event_tx: &broadcast::Sender<EngineEvent>,
    item_id: ItemId,
    sequence_number: u32,
) -> Result<TaskResult, PipelineError> {
    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        match service.get_task_status(task_id).await {
            Ok(response) => match response.status {
                RemoteTaskStatus::Succeeded => {
                    tracing::debug!(sequence_number, %task_id, attempt, "Task succeeded");
                    return Ok(TaskResult {
                        task_id: task_id.to_string(),
                        outputs: response.result.unwrap_or(serde_json::Value::Null),
                    });
                }
                RemoteTaskStatus::Failed => {
                    let reason = response
                        .error
                        .unwrap_or_else(|| "provider reported failure".to_string());
                    tracing::debug!(sequence_number, %task_id, attempt, %reason, "Task failed");
                    return Err(PipelineError::Generation(reason));
                }
                RemoteTaskStatus::Queued | RemoteTaskStatus::Running => {
                    let fraction = poll_fraction(attempt, config.max_attempts, POLL_PROGRESS_CAP);
                    let _ = event_tx.send(EngineEvent::ItemProgress {
                        item_id,
                        sequence_number,
                        fraction,
                    });
                }
            },
            Err(e) => {
                // A dropped poll is not fatal; the attempt budget still
                // bounds the total wait.
                tracing::warn!(sequence_number, %task_id, attempt, error = %e, "Poll request failed");
            }
        }
    }

    Err(PipelineError::PollTimeout {
        attempts: config.max_attempts,
    })
}
