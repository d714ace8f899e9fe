//! Final report of a settled batch run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use promptbatch_core::export::{render_failures, ExportFormat};
use promptbatch_core::item::{BatchItem, ItemStatus};
use promptbatch_core::progress::BatchProgress;

use crate::events::RunOutcome;

/// Everything a driver needs after a run settles.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Final disposition of the run.
    pub outcome: RunOutcome,
    /// Final aggregate progress. `completed` counts settled items only;
    /// items never admitted (after a stop) are not counted.
    pub progress: BatchProgress,
    /// Every item in input order, carrying its result or failure.
    pub items: Vec<BatchItem>,
    /// When the run was started (UTC).
    pub started_at: DateTime<Utc>,
    /// When the run settled (UTC).
    pub finished_at: DateTime<Utc>,
}

/// Per-status item counts derived from a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub succeeded: usize,
    pub failed: usize,
    /// Items never admitted before a stop; still `Queued`.
    pub not_run: usize,
}

impl RunReport {
    /// Count items by final status.
    pub fn counts(&self) -> RunCounts {
        count_statuses(&self.items)
    }

    /// Render all failed items in the requested export format.
    pub fn export_failures(&self, format: ExportFormat) -> String {
        render_failures(&self.items, format)
    }
}

/// Count settled and never-run items.
pub(crate) fn count_statuses(items: &[BatchItem]) -> RunCounts {
    let mut counts = RunCounts {
        succeeded: 0,
        failed: 0,
        not_run: 0,
    };
    for item in items {
        match item.status {
            ItemStatus::Succeeded => counts.succeeded += 1,
            ItemStatus::Failed => counts.failed += 1,
            ItemStatus::Queued | ItemStatus::Running => counts.not_run += 1,
        }
    }
    counts
}

/// Derive the run outcome from how the run ended and what settled.
pub(crate) fn derive_outcome(terminated: bool, counts: RunCounts) -> RunOutcome {
    if terminated {
        RunOutcome::Terminated
    } else if counts.failed == 0 {
        RunOutcome::AllSucceeded
    } else {
        RunOutcome::CompletedWithFailures {
            failed: counts.failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
