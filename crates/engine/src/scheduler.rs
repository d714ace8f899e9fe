//! Concurrency-bounded batch scheduler.
//!
//! [`BatchScheduler`] owns the run-level state machine and drives a batch
//! of items through the per-item pipeline under a bounded in-flight
//! budget. Admission is strictly in input order; completion order is
//! unconstrained.
//!
//! Control flow during a run:
//!
//! - **pause** blocks admission on an awaitable `watch` gate; in-flight
//!   items continue to completion.
//! - **stop** halts admission; in-flight items finish and their results
//!   are still recorded. The provider has no cancel primitive, so
//!   in-flight work is never aborted.
//! - item terminal fields and the aggregate progress counter have exactly
//!   one writer: the aggregator task, which receives completion messages
//!   over a channel from the concurrently running pipelines.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch, Semaphore};
use tokio::task::JoinSet;

use promptbatch_core::error::CoreError;
use promptbatch_core::item::{BatchItem, ItemFailure, ItemId, TaskResult};
use promptbatch_core::progress::BatchProgress;
use promptbatch_core::run::{state_machine, ExecutionState};
use promptbatch_provider::TaskService;

use crate::config::EngineConfig;
use crate::events::{EngineEvent, EVENT_CHANNEL_CAPACITY};
use crate::pipeline;
use crate::report::{count_statuses, derive_outcome, RunReport};

/// Errors surfaced by the scheduler itself.
///
/// These are programming or operator errors only -- remote failures are
/// recorded on individual items and never fail the run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `run()` was invoked with no items.
    #[error("Batch must contain at least one item")]
    EmptyBatch,

    /// The engine configuration failed validation.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// A control call was invalid in the current execution state.
    #[error("{0}")]
    InvalidTransition(String),

    /// The aggregator task died; the run's results are lost.
    #[error("Run aggregation failed: {0}")]
    Aggregator(String),
}

/// Message from an in-flight pipeline to the aggregator.
enum ItemUpdate {
    /// The item was admitted into flight.
    Started { id: ItemId },
    /// The item's pipeline settled.
    Settled {
        id: ItemId,
        outcome: Result<TaskResult, ItemFailure>,
    },
}

/// Drives batches of generation requests against a [`TaskService`].
///
/// One scheduler instance owns one run at a time; the in-flight budget is
/// a per-instance semaphore, so multiple schedulers in one process cannot
/// cross-contaminate each other's limits. Controls (`pause`, `resume`,
/// `stop`) and `subscribe` may be called from any task while `run` is in
/// progress; share the scheduler via `Arc`.
pub struct BatchScheduler {
    service: Arc<dyn TaskService>,
    config: EngineConfig,
    state_tx: watch::Sender<ExecutionState>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl std::fmt::Debug for BatchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("config", &self.config)
            .field("state", &*self.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl BatchScheduler {
    /// Create a scheduler over the given provider service.
    pub fn new(service: Arc<dyn TaskService>, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let (state_tx, _) = watch::channel(ExecutionState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            service,
            config,
            state_tx,
            event_tx,
        })
    }

    /// Current execution state.
    pub fn state(&self) -> ExecutionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to engine events for the current and subsequent runs.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Stop admitting new items until [`resume`](Self::resume).
    pub fn pause(&self) -> Result<(), EngineError> {
        self.transition(ExecutionState::Paused)
    }

    /// Resume admission after a pause.
    pub fn resume(&self) -> Result<(), EngineError> {
        self.transition(ExecutionState::Running)
    }

    /// Stop the run: no new admissions; in-flight items finish normally.
    pub fn stop(&self) -> Result<(), EngineError> {
        self.transition(ExecutionState::Terminated)
    }

    /// Apply a state transition if the state machine allows it.
    fn transition(&self, to: ExecutionState) -> Result<(), EngineError> {
        let mut outcome = Ok(());
        self.state_tx.send_if_modified(|state| {
            match state_machine::validate_transition(*state, to) {
                Ok(()) => {
                    *state = to;
                    true
                }
                Err(msg) => {
                    outcome = Err(EngineError::InvalidTransition(msg));
                    false
                }
            }
        });
        if outcome.is_ok() {
            tracing::info!(state = to.label(), "Run state changed");
            let _ = self.event_tx.send(EngineEvent::StateChanged { state: to });
        }
        outcome
    }

    /// Execute the batch start-to-finish.
    ///
    /// Every item is reset to queued first -- a batch runs fresh or not at
    /// all; there is no resume-from-partial-completion across runs. The
    /// returned report carries the items back with their outcomes. Fails
    /// only on precondition violations, never on remote errors.
    pub async fn run(&self, mut items: Vec<BatchItem>) -> Result<RunReport, EngineError> {
        if items.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        self.transition(ExecutionState::Running)?;

        let started_at = Utc::now();
        for item in &mut items {
            item.reset();
        }
        let total = items.len();
        tracing::info!(
            total,
            concurrency_limit = self.config.concurrency_limit,
            max_retries = self.config.max_retries,
            "Batch run started",
        );
        let _ = self.event_tx.send(EngineEvent::RunStarted { total });
        let _ = self.event_tx.send(EngineEvent::ProgressUpdated { completed: 0, total });

        // Launch specs are captured up front so the aggregator task can
        // take ownership of the items themselves.
        let specs: Vec<(ItemId, u32, serde_json::Value)> = items
            .iter()
            .map(|i| (i.id, i.sequence_number, i.request.clone()))
            .collect();

        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let aggregator = tokio::spawn(aggregate(items, update_rx, self.event_tx.clone()));

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit));
        let pipeline_config = self.config.pipeline();
        let mut pipelines = JoinSet::new();
        let mut state_rx = self.state_tx.subscribe();

        for (item_id, sequence_number, request) in specs {
            // (a) Block while paused. The gate wakes for any non-paused
            // state, so a stop issued mid-pause also gets through.
            let state = match state_rx.wait_for(|s| *s != ExecutionState::Paused).await {
                Ok(state) => *state,
                Err(_) => ExecutionState::Terminated,
            };
            // (b) Stop admitting once the run is terminated.
            if state == ExecutionState::Terminated {
                tracing::info!(sequence_number, "Admission halted by stop request");
                break;
            }
            // (c) Wait for a free in-flight slot.
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            // (d) Rate limiting, applied once per admission (not per retry).
            if !self.config.throttle.is_zero() {
                tokio::time::sleep(self.config.throttle).await;
            }
            // (e) Launch the pipeline and move on without awaiting it.
            let _ = update_tx.send(ItemUpdate::Started { id: item_id });
            let _ = self.event_tx.send(EngineEvent::ItemStarted {
                item_id,
                sequence_number,
            });
            tracing::debug!(sequence_number, "Item admitted");

            let service = Arc::clone(&self.service);
            let event_tx = self.event_tx.clone();
            let update_tx = update_tx.clone();
            let config = pipeline_config.clone();
            pipelines.spawn(async move {
                let outcome = pipeline::run_item(
                    service.as_ref(),
                    &request,
                    &config,
                    &event_tx,
                    item_id,
                    sequence_number,
                )
                .await
                .map_err(ItemFailure::from);
                let _ = update_tx.send(ItemUpdate::Settled {
                    id: item_id,
                    outcome,
                });
                // The permit is released only after the settlement is on
                // the channel, so the aggregator observes the old item
                // leaving flight before a new one enters.
                drop(permit);
            });
        }

        // Join every launched pipeline before settling, regardless of how
        // the admission loop exited.
        while pipelines.join_next().await.is_some() {}
        drop(update_tx);

        let (items, progress) = aggregator
            .await
            .map_err(|e| EngineError::Aggregator(e.to_string()))?;

        let mut terminated = self.state() == ExecutionState::Terminated;
        if !terminated && self.transition(ExecutionState::Completed).is_err() {
            // A stop raced the final settlement; honor it.
            terminated = self.state() == ExecutionState::Terminated;
        }
        let outcome = derive_outcome(terminated, count_statuses(&items));
        tracing::info!(
            completed = progress.completed,
            total = progress.total,
            outcome = %outcome,
            "Batch run finished",
        );
        let _ = self.event_tx.send(EngineEvent::RunFinished { outcome });

        Ok(RunReport {
            outcome,
            progress,
            items,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Single writer for item terminal fields and aggregate progress.
///
/// Runs until every update sender is dropped, then hands the items back.
async fn aggregate(
    mut items: Vec<BatchItem>,
    mut updates: mpsc::UnboundedReceiver<ItemUpdate>,
    event_tx: broadcast::Sender<EngineEvent>,
) -> (Vec<BatchItem>, BatchProgress) {
    let mut progress = BatchProgress::new(items.len());

    while let Some(update) = updates.recv().await {
        match update {
            ItemUpdate::Started { id } => {
                if let Some(item) = items.iter_mut().find(|i| i.id == id) {
                    item.mark_running();
                }
            }
            ItemUpdate::Settled { id, outcome } => {
                let Some(item) = items.iter_mut().find(|i| i.id == id) else {
                    continue;
                };
                let settled = match outcome {
                    Ok(result) => item.settle_success(result),
                    Err(failure) => {
                        tracing::warn!(
                            sequence_number = item.sequence_number,
                            error = %failure,
                            "Item failed",
                        );
                        item.settle_failure(failure)
                    }
                };
                // Duplicate settlements are discarded so the counter and
                // events fire at most once per item.
                if settled {
                    progress.record_completion();
                    let _ = event_tx.send(EngineEvent::ItemCompleted {
                        item_id: id,
                        sequence_number: item.sequence_number,
                        status: item.status,
                        error: item.error.as_ref().map(|e| e.to_string()),
                    });
                    let _ = event_tx.send(EngineEvent::ProgressUpdated {
                        completed: progress.completed,
                        total: progress.total,
                    });
                }
            }
        }
    }

    (items, progress)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
