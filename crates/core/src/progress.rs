//! Aggregate and per-item progress arithmetic.

use serde::Serialize;

/// Fraction at which per-item poll progress is capped so an observer never
/// sees 100% before the task has actually settled.
pub const POLL_PROGRESS_CAP: f64 = 0.95;

// ---------------------------------------------------------------------------
// BatchProgress
// ---------------------------------------------------------------------------

/// Aggregate run progress: items settled vs. items total.
///
/// `completed` is monotonically non-decreasing and never exceeds `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Fresh progress for a batch of `total` items.
    pub fn new(total: usize) -> Self {
        Self { completed: 0, total }
    }

    /// Record one item settlement.
    ///
    /// Returns `false` (without incrementing) when `completed` has already
    /// reached `total`, so a stray extra completion cannot push the counter
    /// past the denominator.
    pub fn record_completion(&mut self) -> bool {
        if self.completed >= self.total {
            return false;
        }
        self.completed += 1;
        true
    }

    /// Whether every item has settled.
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    /// Completion fraction in `0.0..=1.0` (0 for an empty batch).
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }
}

// ---------------------------------------------------------------------------
// Poll progress
// ---------------------------------------------------------------------------

/// Per-item progress fraction after `attempt` of `max_attempts` polls.
///
/// Computed as `min(attempt / max_attempts, cap)`; the final jump to 100%
/// is reserved for true settlement.
pub fn poll_fraction(attempt: u32, max_attempts: u32, cap: f64) -> f64 {
    if max_attempts == 0 {
        return cap;
    }
    (attempt as f64 / max_attempts as f64).min(cap)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
