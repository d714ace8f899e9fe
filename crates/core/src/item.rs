//! Batch items and their settlement rules.
//!
//! A [`BatchItem`] is one parsed generation request plus its execution
//! state. Terminal fields (`status`, `result`, `error`) are written exactly
//! once per run via [`BatchItem::settle_success`] /
//! [`BatchItem::settle_failure`]; duplicate settlements are rejected so a
//! re-delivered completion cannot corrupt state.

use serde::Serialize;
use uuid::Uuid;

/// Opaque unique identifier for a batch item, assigned at parse time.
pub type ItemId = Uuid;

// ---------------------------------------------------------------------------
// ItemStatus
// ---------------------------------------------------------------------------

/// Execution status of a single batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Item has not been admitted into flight.
    Queued,
    /// Item's pipeline has been admitted and has not yet settled.
    Running,
    /// Item settled with a result.
    Succeeded,
    /// Item settled with an error.
    Failed,
}

impl ItemStatus {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }

    /// Whether the status is terminal (`Succeeded` or `Failed`).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// Failure taxonomy
// ---------------------------------------------------------------------------

/// Classification tag attached to an item failure.
///
/// Retained in the error message and the export output so that failure
/// categories stay distinguishable even though the data model does not
/// treat them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed request rejected before submission. Never retried.
    Validation,
    /// The create-task call failed after any applicable retries.
    Submission,
    /// The provider executed the task and reported failure.
    Generation,
    /// Polling exhausted its attempt budget without a terminal status.
    PollTimeout,
}

impl FailureKind {
    /// Stable tag used in error messages and structured export.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Submission => "submission",
            Self::Generation => "generation",
            Self::PollTimeout => "poll_timeout",
        }
    }
}

/// A settled failure: classification tag plus human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ItemFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

// ---------------------------------------------------------------------------
// TaskResult
// ---------------------------------------------------------------------------

/// Output of a successfully completed remote task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    /// Provider-assigned identifier of the remote task.
    pub task_id: String,
    /// Raw output data from the provider (artifact URLs, metadata, etc.).
    pub outputs: serde_json::Value,
}

// ---------------------------------------------------------------------------
// BatchItem
// ---------------------------------------------------------------------------

/// One parsed generation request and its execution state.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    /// Opaque unique identifier, assigned at parse time.
    pub id: ItemId,
    /// 1-based position in the original input. Stable across runs; used for
    /// ordering and export.
    pub sequence_number: u32,
    /// The raw prompt line this item was parsed from.
    pub original_input: String,
    /// Provider-agnostic submission payload. Immutable once built.
    pub request: serde_json::Value,
    /// Current execution status.
    pub status: ItemStatus,
    /// Present iff `status == Succeeded`.
    pub result: Option<TaskResult>,
    /// Present iff `status == Failed`.
    pub error: Option<ItemFailure>,
}

impl BatchItem {
    /// Create a fresh item in `Queued` state with a new id.
    pub fn new(
        sequence_number: u32,
        original_input: impl Into<String>,
        request: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            sequence_number,
            original_input: original_input.into(),
            request,
            status: ItemStatus::Queued,
            result: None,
            error: None,
        }
    }

    /// Reset the item to `Queued`, clearing any prior outcome.
    ///
    /// Performed only when the whole batch is restarted.
    pub fn reset(&mut self) {
        self.status = ItemStatus::Queued;
        self.result = None;
        self.error = None;
    }

    /// Mark the item as admitted into flight.
    ///
    /// Returns `false` (and leaves the item untouched) unless the item is
    /// currently `Queued`.
    pub fn mark_running(&mut self) -> bool {
        if self.status != ItemStatus::Queued {
            return false;
        }
        self.status = ItemStatus::Running;
        true
    }

    /// Settle the item as `Succeeded` with the given result.
    ///
    /// Returns `false` if the item is already terminal; the duplicate
    /// settlement is discarded.
    pub fn settle_success(&mut self, result: TaskResult) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = ItemStatus::Succeeded;
        self.result = Some(result);
        self.error = None;
        true
    }

    /// Settle the item as `Failed` with the given failure.
    ///
    /// Returns `false` if the item is already terminal; the duplicate
    /// settlement is discarded.
    pub fn settle_failure(&mut self, failure: ItemFailure) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = ItemStatus::Failed;
        self.error = Some(failure);
        self.result = None;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
