// state.rs — The goal state machine.
//
// A goal moves through a fixed, small graph of states driven by events:
//
//   Accepted  --Execute-->    Executing
//   Accepted  --CancelGoal--> Canceling
//   Executing --CancelGoal--> Canceling
//   Executing --Succeed-->    Succeeded
//   Executing --Abort-->      Aborted
//   Canceling --Succeed-->    Succeeded
//   Canceling --Abort-->      Aborted
//   Canceling --Canceled-->   Canceled
//
// Succeeded, Canceled and Aborted are terminal: every event is rejected.
// Nothing here stores state; `transition` is a pure lookup.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle state of an accepted goal.
///
/// No `Unknown` variant: an unknown state can be
/// observed through [`StateQuery::Unknown`] but never stored in a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalState {
    /// Accepted by the server, not yet running.
    Accepted,

    /// Being worked on.
    Executing,

    /// A cancel request was accepted; the executor has not finished yet.
    Canceling,

    /// Finished successfully.
    Succeeded,

    /// Finished in response to a cancel request.
    Canceled,

    /// Finished unsuccessfully without being asked to cancel.
    Aborted,
}

impl GoalState {
    pub const ALL: [GoalState; 6] = [
        GoalState::Accepted,
        GoalState::Executing,
        GoalState::Canceling,
        GoalState::Succeeded,
        GoalState::Canceled,
        GoalState::Aborted,
    ];

    /// Terminal states accept no further events.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GoalState::Succeeded | GoalState::Canceled | GoalState::Aborted
        )
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// The status code used by goal status messages on the wire
    /// (`0` is reserved for "unknown").
    pub fn status_code(self) -> i8 {
        match self {
            GoalState::Accepted => 1,
            GoalState::Executing => 2,
            GoalState::Canceling => 3,
            GoalState::Succeeded => 4,
            GoalState::Canceled => 5,
            GoalState::Aborted => 6,
        }
    }

    /// Inverse of [`GoalState::status_code`]. `0` and out-of-range codes
    /// map to `None`.
    pub fn from_status_code(code: i8) -> Option<GoalState> {
        GoalState::ALL
            .into_iter()
            .find(|state| state.status_code() == code)
    }
}

impl fmt::Display for GoalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalState::Accepted => write!(f, "accepted"),
            GoalState::Executing => write!(f, "executing"),
            GoalState::Canceling => write!(f, "canceling"),
            GoalState::Succeeded => write!(f, "succeeded"),
            GoalState::Canceled => write!(f, "canceled"),
            GoalState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Events that drive a goal from one state to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalEvent {
    Execute,
    CancelGoal,
    Succeed,
    Abort,
    Canceled,
}

impl GoalEvent {
    pub const ALL: [GoalEvent; 5] = [
        GoalEvent::Execute,
        GoalEvent::CancelGoal,
        GoalEvent::Succeed,
        GoalEvent::Abort,
        GoalEvent::Canceled,
    ];
}

impl fmt::Display for GoalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalEvent::Execute => write!(f, "execute"),
            GoalEvent::CancelGoal => write!(f, "cancel_goal"),
            GoalEvent::Succeed => write!(f, "succeed"),
            GoalEvent::Abort => write!(f, "abort"),
            GoalEvent::Canceled => write!(f, "canceled"),
        }
    }
}

/// Rejection returned by [`transition`] for an illegal `(state, event)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event {event} is not valid in state {state}")]
pub struct InvalidTransition {
    pub state: GoalState,
    pub event: GoalEvent,
}

/// Compute the state a goal in `state` moves to when `event` occurs.
pub fn transition(state: GoalState, event: GoalEvent) -> Result<GoalState, InvalidTransition> {
    use GoalEvent as E;
    use GoalState as S;

    match (state, event) {
        (S::Accepted, E::Execute) => Ok(S::Executing),
        (S::Accepted | S::Executing, E::CancelGoal) => Ok(S::Canceling),
        (S::Executing | S::Canceling, E::Succeed) => Ok(S::Succeeded),
        (S::Executing | S::Canceling, E::Abort) => Ok(S::Aborted),
        (S::Canceling, E::Canceled) => Ok(S::Canceled),
        _ => Err(InvalidTransition { state, event }),
    }
}

/// Result of a state query that may not resolve to a storable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateQuery {
    Known(GoalState),
    Unknown,
}

impl StateQuery {
    pub fn state(self) -> Option<GoalState> {
        match self {
            StateQuery::Known(state) => Some(state),
            StateQuery::Unknown => None,
        }
    }

    pub fn status_code(self) -> i8 {
        self.state().map_or(0, GoalState::status_code)
    }
}

/// Like [`transition`], but reports an illegal pair as [`StateQuery::Unknown`]
/// instead of an error.
pub fn transition_or_unknown(state: GoalState, event: GoalEvent) -> StateQuery {
    match transition(state, event) {
        Ok(next) => StateQuery::Known(next),
        Err(_) => StateQuery::Unknown,
    }
}
