// error.rs — Error types for goal state transitions.

use thiserror::Error;

use crate::state::{GoalEvent, GoalState};
use crate::types::GoalId;

/// Errors that can occur while driving a single goal through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoalError {
    /// The event is not legal for the state the goal is currently in.
    /// The goal's state is left unchanged.
    #[error("invalid transition from {state} with event {event} for goal {goal_id}")]
    InvalidTransition {
        goal_id: GoalId,
        state: GoalState,
        event: GoalEvent,
    },
}
