//! Per-project mutation state machine
//!
//! `Idle -> Patching -> Idle` on success, `Patching -> Failed -> Idle` on any
//! error. While `Patching`, no second mutation may start; on failure the
//! live collection is left exactly as it was before the attempt.

use serde::{Deserialize, Serialize};

/// Mutation state of an active project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectState {
    /// No mutation in flight
    Idle,
    /// A patch request is being generated or applied
    Patching,
    /// The last mutation failed; the error has been surfaced
    Failed,
}

/// Errors from illegal state transitions
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The requested transition is not allowed
    #[error("illegal project state transition: {from:?} -> {to:?}")]
    IllegalTransition { from: ProjectState, to: ProjectState },
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: ProjectState) -> Vec<ProjectState> {
    use ProjectState::*;
    match from {
        Idle => vec![Patching],
        Patching => vec![Idle, Failed],
        Failed => vec![Idle],
    }
}

/// Validate a state transition
///
/// # Errors
/// Returns [`StateError::IllegalTransition`] if the move is not allowed.
pub fn validate_transition(from: ProjectState, to: ProjectState) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}
