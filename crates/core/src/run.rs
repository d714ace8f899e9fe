//! Run-level execution state machine.
//!
//! A batch run moves through [`ExecutionState`]s under operator control
//! (`start`/`pause`/`resume`/`stop`) and engine control (automatic
//! completion). The transition table is the single source of truth; the
//! scheduler validates every transition against it.

use serde::Serialize;

/// Execution state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// No run has been started yet.
    Idle,
    /// Items are being admitted and executed.
    Running,
    /// No new items are admitted; in-flight items continue.
    Paused,
    /// Every item reached a terminal status without a stop request.
    Completed,
    /// The operator stopped the run; unadmitted items were never run.
    Terminated,
}

impl ExecutionState {
    /// Human-readable label for display and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
            Self::Terminated => "Terminated",
        }
    }
}

pub mod state_machine {
    use super::ExecutionState;

    /// Returns the set of valid target states reachable from `from`.
    ///
    /// `Completed` and `Terminated` are terminal for the run but allow a
    /// fresh `Running` because re-executing a batch resets all items.
    /// `Paused -> Completed` covers a run whose last in-flight item
    /// settles while admission is paused.
    pub fn valid_transitions(from: ExecutionState) -> &'static [ExecutionState] {
        match from {
            ExecutionState::Idle => &[ExecutionState::Running],
            ExecutionState::Running => &[
                ExecutionState::Paused,
                ExecutionState::Completed,
                ExecutionState::Terminated,
            ],
            ExecutionState::Paused => &[
                ExecutionState::Running,
                ExecutionState::Completed,
                ExecutionState::Terminated,
            ],
            ExecutionState::Completed => &[ExecutionState::Running],
            ExecutionState::Terminated => &[ExecutionState::Running],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: ExecutionState, to: ExecutionState) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning a descriptive error message
    /// for invalid ones.
    pub fn validate_transition(from: ExecutionState, to: ExecutionState) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!(
                "Invalid transition: {} -> {}",
                from.label(),
                to.label()
            ))
        }
    }
}
