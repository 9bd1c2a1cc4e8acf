// expiry.rs — Discarding finished goals after the retention window.
//
// A goal expires once it is terminal and `now - terminal_at >= retention`.
// Every expired goal is removed; at most `capacity` of their infos are
// returned, but the total count is always reported so callers can tell the
// output was truncated.
//
// ExpiryTimer tracks the earliest upcoming deadline so an owner can arm a
// wake-up timer. It is recomputed whenever a goal finishes or goals expire.

use std::time::Duration;

use act_goal::{GoalHandle, GoalInfo, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::registry::GoalRegistry;

/// Goals removed by one expiry pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryReport {
    /// Up to `capacity` expired goals, in acceptance order.
    pub expired: Vec<GoalInfo>,
    /// Number of goals actually removed. May exceed `expired.len()`.
    pub total: usize,
}

impl ExpiryReport {
    pub fn is_truncated(&self) -> bool {
        self.total > self.expired.len()
    }
}

/// Whether `handle` is past its retention window at `now`.
pub fn is_expired(handle: &GoalHandle, now: Timestamp, retention: Duration) -> bool {
    handle
        .terminal_at()
        .and_then(|finished| now.duration_since(finished))
        .is_some_and(|age| age >= retention)
}

/// Remove every expired goal from `registry`.
///
/// `capacity` is the room the caller has for expired goal infos; `None`
/// asks for a count only. `Some(0)` is a usage error.
pub fn expire(
    registry: &mut GoalRegistry,
    now: Timestamp,
    retention: Duration,
    capacity: Option<usize>,
) -> Result<ExpiryReport, ServerError> {
    if capacity == Some(0) {
        return Err(ServerError::InvalidCapacity);
    }

    let expired: Vec<GoalInfo> = registry
        .all()
        .filter(|handle| is_expired(handle, now, retention))
        .map(|handle| *handle.info())
        .collect();

    for info in &expired {
        registry.remove(&info.id);
        tracing::debug!(goal_id = %info.id, "goal expired");
    }

    let total = expired.len();
    let mut kept = expired;
    kept.truncate(capacity.unwrap_or(0));

    if total > 0 {
        tracing::info!(expired = total, remaining = registry.len(), "expired goals");
    }

    Ok(ExpiryReport {
        expired: kept,
        total,
    })
}

/// Earliest time at which some finished goal will expire.
pub fn next_deadline(registry: &GoalRegistry, retention: Duration) -> Option<Timestamp> {
    registry
        .all()
        .filter_map(GoalHandle::terminal_at)
        .map(|finished| finished.saturating_add(retention))
        .min()
}

/// The deadline an owner should wake up at to expire goals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryTimer {
    deadline: Option<Timestamp>,
}

impl ExpiryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the deadline after a goal finished. With no finished goals
    /// the timer is disarmed.
    pub fn notify_goal_done(&mut self, registry: &GoalRegistry, retention: Duration) -> Option<Timestamp> {
        self.deadline = next_deadline(registry, retention);
        match self.deadline {
            Some(deadline) => tracing::debug!(%deadline, "expiry timer armed"),
            None => tracing::debug!("expiry timer disarmed"),
        }
        self.deadline
    }

    pub fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the deadline, or zero once it has passed.
    pub fn time_until_expiry(&self, now: Timestamp) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.duration_since(now).unwrap_or(Duration::ZERO))
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}
