// cancel.rs — Cancel request processing.
//
// A cancel request names a goal id, a time bound, both, or neither:
//
//   neither          → every cancelable goal
//   time bound only  → cancelable goals accepted at or before the bound
//   id only          → that goal, if it is cancelable
//   id + time bound  → union of the two, the id-matched goal last
//
// On the wire an all-zero id and a zero stamp mean "absent"; both are
// normalized here so a zeroed request always means "cancel everything".
// Selected goals are moved to Canceling before the response is built.

use std::fmt;

use act_goal::{GoalEvent, GoalId, GoalInfo, Timestamp};
use serde::{Deserialize, Serialize};

use crate::registry::GoalRegistry;

/// Which goals a requester wants canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<GoalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_or_before: Option<Timestamp>,
}

impl CancelRequest {
    /// Cancel every cancelable goal.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn goal(id: GoalId) -> Self {
        Self {
            target_id: Some(id),
            at_or_before: None,
        }
    }

    pub fn at_or_before(stamp: Timestamp) -> Self {
        Self {
            target_id: None,
            at_or_before: Some(stamp),
        }
    }

    pub fn goal_or_before(id: GoalId, stamp: Timestamp) -> Self {
        Self {
            target_id: Some(id),
            at_or_before: Some(stamp),
        }
    }

    /// Decode the wire form, where the request is a goal info whose zero
    /// id and zero stamp stand for "absent".
    pub fn from_wire(info: GoalInfo) -> Self {
        Self {
            target_id: Some(info.id),
            at_or_before: Some(info.accepted_at),
        }
        .normalized()
    }

    /// Encode back to the wire form.
    pub fn to_wire(&self) -> GoalInfo {
        GoalInfo::new(
            self.target_id.unwrap_or(GoalId::ZERO),
            self.at_or_before.unwrap_or(Timestamp::ZERO),
        )
    }

    /// Drop a zero id or zero time bound.
    pub fn normalized(self) -> Self {
        Self {
            target_id: self.target_id.filter(|id| !id.is_zero()),
            at_or_before: self.at_or_before.filter(|stamp| !stamp.is_zero()),
        }
    }

    pub fn is_cancel_all(&self) -> bool {
        let normalized = self.normalized();
        normalized.target_id.is_none() && normalized.at_or_before.is_none()
    }
}

/// Result code of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// Processed normally. Canceling nothing is still success.
    None,
    /// The owner refused the request.
    Rejected,
    /// The requested goal is not tracked.
    UnknownGoalId,
    /// The requested goal can no longer be canceled.
    GoalTerminated,
}

impl CancelOutcome {
    /// Return code used by cancel responses on the wire.
    pub fn return_code(self) -> i8 {
        match self {
            CancelOutcome::None => 0,
            CancelOutcome::Rejected => 1,
            CancelOutcome::UnknownGoalId => 2,
            CancelOutcome::GoalTerminated => 3,
        }
    }
}

impl fmt::Display for CancelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelOutcome::None => write!(f, "none"),
            CancelOutcome::Rejected => write!(f, "rejected"),
            CancelOutcome::UnknownGoalId => write!(f, "unknown_goal_id"),
            CancelOutcome::GoalTerminated => write!(f, "goal_terminated"),
        }
    }
}

/// Goals moved to Canceling, in selection order, plus the result code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResponse {
    pub canceling: Vec<GoalInfo>,
    pub outcome: CancelOutcome,
}

impl CancelResponse {
    /// A refusal that cancels nothing.
    pub fn rejected() -> Self {
        Self {
            canceling: Vec::new(),
            outcome: CancelOutcome::Rejected,
        }
    }
}

/// Select the goals matched by `request`, move each to Canceling, and
/// describe what happened.
pub fn process(request: &CancelRequest, registry: &mut GoalRegistry, now: Timestamp) -> CancelResponse {
    let request = request.normalized();
    let mut selected: Vec<GoalInfo> = Vec::new();

    match (request.target_id, request.at_or_before) {
        (None, None) => {
            selected.extend(
                registry
                    .all()
                    .filter(|handle| handle.is_cancelable())
                    .map(|handle| *handle.info()),
            );
        }
        (target, bound) => {
            if let Some(bound) = bound {
                selected.extend(
                    registry
                        .all()
                        .filter(|handle| handle.is_cancelable() && handle.accepted_at() <= bound)
                        .map(|handle| *handle.info()),
                );
            }
            if let Some(id) = target {
                let matched = registry.get(&id).filter(|handle| handle.is_cancelable());
                if let Some(handle) = matched {
                    if !selected.iter().any(|info| info.id == id) {
                        selected.push(*handle.info());
                    }
                }
            }
        }
    }

    let outcome = match request.target_id {
        Some(id) if selected.is_empty() => {
            if registry.contains(&id) {
                CancelOutcome::GoalTerminated
            } else {
                CancelOutcome::UnknownGoalId
            }
        }
        _ => CancelOutcome::None,
    };

    // Selection only holds cancelable goals, so every apply succeeds.
    selected.retain(|info| {
        registry
            .get_mut(&info.id)
            .is_some_and(|handle| handle.apply(GoalEvent::CancelGoal, now).is_ok())
    });

    tracing::info!(
        canceling = selected.len(),
        outcome = %outcome,
        "processed cancel request"
    );

    CancelResponse {
        canceling: selected,
        outcome,
    }
}
