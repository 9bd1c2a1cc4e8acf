// status.rs — Goal status snapshots for status publication.

use act_goal::{GoalInfo, GoalState};
use serde::{Deserialize, Serialize};

use crate::registry::GoalRegistry;

/// One line of a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStatus {
    pub info: GoalInfo,
    pub status: GoalState,
}

/// Every tracked goal and its current state, in acceptance order.
pub fn snapshot(registry: &GoalRegistry) -> Vec<GoalStatus> {
    registry
        .all()
        .map(|handle| GoalStatus {
            info: *handle.info(),
            status: handle.status(),
        })
        .collect()
}
