// events.rs — Server events and notification dispatch.
//
// The action server emits an event whenever its goal bookkeeping changes:
// a goal is accepted, changes state, a cancel request is processed, or
// goals expire. In-process observers subscribe via the EventDispatcher.
// Sinks observe only; a failing sink never fails the operation that
// produced the event. Nothing here touches the filesystem: persisting
// events is up to whoever owns the sink.

use act_goal::{GoalId, GoalInfo, GoalState, Timestamp};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelOutcome;
use crate::error::ServerError;

/// Events emitted by an action server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A new goal is being tracked.
    GoalAccepted { goal: GoalInfo, at: Timestamp },

    /// A tracked goal changed state.
    GoalStateChanged {
        goal_id: GoalId,
        from_state: GoalState,
        to_state: GoalState,
        at: Timestamp,
    },

    /// A cancel request was processed.
    CancelProcessed {
        canceling: Vec<GoalId>,
        outcome: CancelOutcome,
        at: Timestamp,
    },

    /// Finished goals were dropped after their retention window.
    GoalsExpired {
        goal_ids: Vec<GoalId>,
        total: usize,
        at: Timestamp,
    },
}

impl ServerEvent {
    pub fn event_type(&self) -> &str {
        match self {
            ServerEvent::GoalAccepted { .. } => "goal_accepted",
            ServerEvent::GoalStateChanged { .. } => "goal_state_changed",
            ServerEvent::CancelProcessed { .. } => "cancel_processed",
            ServerEvent::GoalsExpired { .. } => "goals_expired",
        }
    }

    pub fn at(&self) -> Timestamp {
        match self {
            ServerEvent::GoalAccepted { at, .. }
            | ServerEvent::GoalStateChanged { at, .. }
            | ServerEvent::CancelProcessed { at, .. }
            | ServerEvent::GoalsExpired { at, .. } => *at,
        }
    }
}

/// Receives server events.
///
/// `send` runs inside the server operation that produced the event, so
/// implementations should hand the event off rather than block.
pub trait NotificationSink: Send {
    /// Handle an event. Errors are logged by the dispatcher and dropped.
    fn send(&self, event: &ServerEvent) -> Result<(), ServerError>;
}

/// Dispatches events to every registered sink.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn has_sinks(&self) -> bool {
        !self.sinks.is_empty()
    }

    pub fn dispatch(&self, event: &ServerEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!("notification sink error: {}", e);
            }
        }
    }
}
