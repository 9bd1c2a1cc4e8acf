// handle.rs — GoalHandle: one accepted goal and its current state.
//
// The handle is the only place a goal's state is stored, and `apply` is the
// only way to change it. A handle has no clock: callers pass `now` so the
// moment a goal finishes can be recorded for expiry.

use serde::Serialize;

use crate::error::GoalError;
use crate::state::{transition, GoalEvent, GoalState};
use crate::types::{GoalId, GoalInfo, Timestamp};

/// A tracked goal.
///
/// Serialize-only: a handle is created by accepting a goal, never decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalHandle {
    info: GoalInfo,
    state: GoalState,

    /// When the goal entered a terminal state. Set once, never cleared.
    #[serde(skip_serializing_if = "Option::is_none")]
    terminal_at: Option<Timestamp>,
}

impl GoalHandle {
    /// Create a handle in the Accepted state.
    pub fn new(info: GoalInfo) -> Self {
        Self {
            info,
            state: GoalState::Accepted,
            terminal_at: None,
        }
    }

    pub fn info(&self) -> &GoalInfo {
        &self.info
    }

    pub fn id(&self) -> GoalId {
        self.info.id
    }

    pub fn accepted_at(&self) -> Timestamp {
        self.info.accepted_at
    }

    pub fn status(&self) -> GoalState {
        self.state
    }

    pub fn terminal_at(&self) -> Option<Timestamp> {
        self.terminal_at
    }

    /// Accepted, Executing or Canceling.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Whether a CancelGoal event would currently be accepted.
    /// A goal already Canceling cannot be canceled again.
    pub fn is_cancelable(&self) -> bool {
        transition(self.state, GoalEvent::CancelGoal).is_ok()
    }

    /// Drive the goal with `event`. On an illegal event the state is left
    /// unchanged and an error is returned.
    pub fn apply(&mut self, event: GoalEvent, now: Timestamp) -> Result<GoalState, GoalError> {
        let next = transition(self.state, event).map_err(|rejected| {
            GoalError::InvalidTransition {
                goal_id: self.info.id,
                state: rejected.state,
                event: rejected.event,
            }
        })?;

        tracing::debug!(
            goal_id = %self.info.id,
            from = %self.state,
            to = %next,
            "goal state transition"
        );

        self.state = next;
        if next.is_terminal() && self.terminal_at.is_none() {
            self.terminal_at = Some(now);
        }
        Ok(next)
    }
}
