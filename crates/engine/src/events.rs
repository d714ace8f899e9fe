//! Engine events published during a batch run.
//!
//! Every state change, admission, poll progress tick, and settlement is
//! broadcast so any number of observers (UI, CLI logger, tests) can follow
//! a run without coupling to the scheduler. Publishing with zero
//! subscribers silently drops the event.

use serde::Serialize;

use promptbatch_core::item::{ItemId, ItemStatus};
use promptbatch_core::run::ExecutionState;

/// Buffer capacity for the engine's broadcast channel. Slow subscribers
/// past this many undelivered events observe `RecvError::Lagged`.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// An observable occurrence during a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineEvent {
    /// A fresh run began; all items were reset to queued.
    RunStarted { total: usize },

    /// The run's execution state changed.
    StateChanged { state: ExecutionState },

    /// An item was admitted into flight.
    ItemStarted { item_id: ItemId, sequence_number: u32 },

    /// An in-flight item's polling made progress. `fraction` is capped
    /// below 1.0 until the item actually settles.
    ItemProgress {
        item_id: ItemId,
        sequence_number: u32,
        fraction: f64,
    },

    /// An item settled. `error` is present iff the item failed.
    ItemCompleted {
        item_id: ItemId,
        sequence_number: u32,
        status: ItemStatus,
        error: Option<String>,
    },

    /// Aggregate progress after a settlement.
    ProgressUpdated { completed: usize, total: usize },

    /// The run settled.
    RunFinished { outcome: RunOutcome },
}

/// Final disposition of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every item succeeded.
    AllSucceeded,
    /// Every admitted item settled, but some failed.
    CompletedWithFailures { failed: usize },
    /// The operator stopped the run before all items were admitted.
    Terminated,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllSucceeded => write!(f, "all items succeeded"),
            Self::CompletedWithFailures { failed } => {
                write!(f, "completed with {failed} failure(s)")
            }
            Self::Terminated => write!(f, "terminated by operator"),
        }
    }
}
