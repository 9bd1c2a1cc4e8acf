// server.rs — ActionServer: the owner of one goal registry.
//
// The server is what transport-facing request handlers talk to. It reads
// its clock once per operation, runs the registry / cancel / expiry logic
// with that `now`, keeps the expiry timer current, and reports each change
// to its event sinks. It performs no transport I/O itself: every result is
// plain data for the caller to publish.
//
// ActionServer is not internally synchronized. An embedder delivering
// requests from several threads must put the whole server behind a single
// lock so accept, cancel, expire and apply_event never overlap.

use act_goal::{Clock, GoalEvent, GoalHandle, GoalId, GoalInfo, GoalState, Timestamp};

use crate::cancel::{self, CancelRequest, CancelResponse};
use crate::config::ServerOptions;
use crate::error::{ConfigError, ServerError};
use crate::events::{EventDispatcher, NotificationSink, ServerEvent};
use crate::expiry::{self, ExpiryReport, ExpiryTimer};
use crate::registry::GoalRegistry;
use crate::status::{self, GoalStatus};

/// Goal bookkeeping for one action.
pub struct ActionServer {
    action_name: String,
    options: ServerOptions,
    registry: GoalRegistry,
    clock: Box<dyn Clock>,
    dispatcher: EventDispatcher,
    expiry_timer: ExpiryTimer,
}

impl ActionServer {
    /// Create a server for `action_name`. Options are validated here so
    /// that a negative retention never reaches the engine.
    pub fn new(
        action_name: impl Into<String>,
        options: ServerOptions,
        clock: impl Clock + 'static,
    ) -> Result<Self, ConfigError> {
        options.validate()?;

        let registry = match options.max_goals {
            Some(limit) => GoalRegistry::with_limit(limit),
            None => GoalRegistry::new(),
        };
        let action_name = action_name.into();
        tracing::info!(
            action = %action_name,
            retention = ?options.retention(),
            "action server created"
        );

        Ok(Self {
            action_name,
            options,
            registry,
            clock: Box::new(clock),
            dispatcher: EventDispatcher::new(),
            expiry_timer: ExpiryTimer::new(),
        })
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.dispatcher.add_sink(sink);
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Start tracking a goal with the given identity and acceptance time.
    pub fn accept_goal(&mut self, info: GoalInfo) -> Result<&GoalHandle, ServerError> {
        let now = self.clock.now();
        let Self {
            registry,
            dispatcher,
            action_name,
            ..
        } = self;

        let handle = registry.accept(info).inspect_err(|e| {
            tracing::warn!(action = %action_name, goal_id = %info.id, "goal rejected: {}", e);
        })?;

        tracing::info!(action = %action_name, goal_id = %info.id, "goal accepted");
        dispatcher.dispatch(&ServerEvent::GoalAccepted { goal: info, at: now });
        Ok(handle)
    }

    /// Accept a goal stamped with the server's current time.
    pub fn accept_new_goal(&mut self, id: GoalId) -> Result<&GoalHandle, ServerError> {
        let info = GoalInfo::new(id, self.clock.now());
        self.accept_goal(info)
    }

    /// Report a state change for a tracked goal.
    ///
    /// Entering a terminal state re-arms the expiry timer.
    pub fn apply_event(&mut self, id: GoalId, event: GoalEvent) -> Result<GoalState, ServerError> {
        let now = self.clock.now();
        let handle = self
            .registry
            .get_mut(&id)
            .ok_or(ServerError::UnknownGoal(id))?;
        let from_state = handle.status();
        let to_state = handle.apply(event, now)?;

        self.dispatcher.dispatch(&ServerEvent::GoalStateChanged {
            goal_id: id,
            from_state,
            to_state,
            at: now,
        });
        if to_state.is_terminal() {
            self.notify_goal_done();
        }
        Ok(to_state)
    }

    /// Process a cancel request against every tracked goal.
    pub fn process_cancel(&mut self, request: &CancelRequest) -> CancelResponse {
        let now = self.clock.now();
        let response = cancel::process(request, &mut self.registry, now);
        self.dispatcher.dispatch(&ServerEvent::CancelProcessed {
            canceling: response.canceling.iter().map(|info| info.id).collect(),
            outcome: response.outcome,
            at: now,
        });
        response
    }

    /// Refuse a cancel request without touching any goal.
    pub fn reject_cancel(&self, request: &CancelRequest) -> CancelResponse {
        let now = self.clock.now();
        tracing::warn!(action = %self.action_name, ?request, "cancel request rejected");
        let response = CancelResponse::rejected();
        self.dispatcher.dispatch(&ServerEvent::CancelProcessed {
            canceling: Vec::new(),
            outcome: response.outcome,
            at: now,
        });
        response
    }

    /// Current status of every tracked goal, in acceptance order.
    pub fn status_snapshot(&self) -> Vec<GoalStatus> {
        status::snapshot(&self.registry)
    }

    /// Drop goals whose retention window has passed.
    ///
    /// `capacity` bounds how many expired goal infos are returned; `None`
    /// returns a count only.
    pub fn expire(&mut self, capacity: Option<usize>) -> Result<ExpiryReport, ServerError> {
        let now = self.clock.now();
        let report = expiry::expire(&mut self.registry, now, self.options.retention(), capacity)?;

        if report.total > 0 {
            self.dispatcher.dispatch(&ServerEvent::GoalsExpired {
                goal_ids: report.expired.iter().map(|info| info.id).collect(),
                total: report.total,
                at: now,
            });
        }
        self.notify_goal_done();
        Ok(report)
    }

    /// Expire goals, returning only how many were removed.
    pub fn expire_count_only(&mut self) -> Result<usize, ServerError> {
        self.expire(None).map(|report| report.total)
    }

    /// Recompute when the next finished goal expires. Called whenever a
    /// goal reaches a terminal state.
    pub fn notify_goal_done(&mut self) -> Option<Timestamp> {
        self.expiry_timer
            .notify_goal_done(&self.registry, self.options.retention())
    }

    pub fn expiry_timer(&self) -> &ExpiryTimer {
        &self.expiry_timer
    }

    pub fn goal_exists(&self, id: &GoalId) -> bool {
        self.registry.contains(id)
    }

    pub fn get_goal(&self, id: &GoalId) -> Option<&GoalHandle> {
        self.registry.get(id)
    }

    /// All tracked goals in acceptance order.
    pub fn goal_handles(&self) -> impl Iterator<Item = &GoalHandle> + '_ {
        self.registry.all()
    }

    pub fn num_goals(&self) -> usize {
        self.registry.len()
    }

    /// Drop every tracked goal (server shutdown).
    pub fn finalize(&mut self) {
        tracing::info!(
            action = %self.action_name,
            dropped = self.registry.len(),
            "action server finalized"
        );
        self.registry.clear();
        self.expiry_timer = ExpiryTimer::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use act_goal::ManualClock;
    use std::time::Duration;

    fn server(clock: &ManualClock) -> ActionServer {
        let options = ServerOptions::default().with_retention(Duration::from_secs(10));
        ActionServer::new("fibonacci", options, clock.clone()).unwrap()
    }

    fn id(n: u8) -> GoalId {
        GoalId::from_bytes([n; 16])
    }

    #[test]
    fn accept_new_goal_stamps_with_clock() {
        let clock = ManualClock::new(Timestamp::from_secs(4));
        let mut server = server(&clock);
        let handle = server.accept_new_goal(id(1)).unwrap();
        assert_eq!(handle.accepted_at(), Timestamp::from_secs(4));
        assert_eq!(server.action_name(), "fibonacci");
    }

    #[test]
    fn apply_event_on_unknown_goal_is_an_argument_error() {
        let clock = ManualClock::default();
        let mut server = server(&clock);
        let result = server.apply_event(id(9), GoalEvent::Execute);
        assert!(matches!(result, Err(ServerError::UnknownGoal(g)) if g == id(9)));
    }

    #[test]
    fn illegal_event_surfaces_invalid_transition() {
        let clock = ManualClock::default();
        let mut server = server(&clock);
        server.accept_new_goal(id(1)).unwrap();
        let result = server.apply_event(id(1), GoalEvent::Canceled);
        assert!(matches!(result, Err(ServerError::InvalidTransition(_))));
        assert_eq!(server.get_goal(&id(1)).unwrap().status(), GoalState::Accepted);
    }

    #[test]
    fn terminal_event_arms_expiry_timer() {
        let clock = ManualClock::new(Timestamp::from_secs(1));
        let mut server = server(&clock);
        server.accept_new_goal(id(1)).unwrap();
        server.apply_event(id(1), GoalEvent::Execute).unwrap();
        assert!(!server.expiry_timer().is_armed());

        clock.set(Timestamp::from_secs(5));
        server.apply_event(id(1), GoalEvent::Succeed).unwrap();
        assert_eq!(server.expiry_timer().deadline(), Some(Timestamp::from_secs(15)));

        clock.set(Timestamp::from_secs(15));
        assert_eq!(server.expire_count_only().unwrap(), 1);
        assert!(!server.expiry_timer().is_armed());
    }

    #[test]
    fn negative_retention_is_refused_at_construction() {
        let options = ServerOptions {
            result_timeout_ns: -5,
            ..ServerOptions::default()
        };
        let result = ActionServer::new("bad", options, ManualClock::default());
        assert!(matches!(result, Err(ConfigError::NegativeRetention(-5))));
    }

    #[test]
    fn reject_cancel_leaves_goals_alone() {
        let clock = ManualClock::default();
        let mut server = server(&clock);
        server.accept_new_goal(id(1)).unwrap();
        let response = server.reject_cancel(&CancelRequest::all());
        assert_eq!(response, CancelResponse::rejected());
        assert_eq!(server.get_goal(&id(1)).unwrap().status(), GoalState::Accepted);
    }

    #[test]
    fn sub_second_retention_is_honored() {
        let clock = ManualClock::new(Timestamp::from_secs(1));
        let options = ServerOptions::default().with_retention(Duration::from_millis(500));
        let mut server = ActionServer::new("short", options, clock.clone()).unwrap();

        server.accept_new_goal(id(1)).unwrap();
        server.apply_event(id(1), GoalEvent::Execute).unwrap();
        server.apply_event(id(1), GoalEvent::Succeed).unwrap();
        assert_eq!(
            server.expiry_timer().deadline(),
            Some(Timestamp::from_nanos(1_500_000_000))
        );
        assert_eq!(server.expire_count_only().unwrap(), 0);

        clock.advance(Duration::from_millis(499));
        assert_eq!(server.expire_count_only().unwrap(), 0);

        clock.advance(Duration::from_millis(1));
        assert_eq!(server.expire_count_only().unwrap(), 1);
    }

    #[test]
    fn goal_handles_iterate_in_acceptance_order() {
        let clock = ManualClock::default();
        let mut server = server(&clock);
        for n in [3, 1, 2] {
            server.accept_new_goal(id(n)).unwrap();
        }
        server.apply_event(id(1), GoalEvent::Execute).unwrap();

        let handles: Vec<(GoalId, GoalState)> = server
            .goal_handles()
            .map(|h| (h.id(), h.status()))
            .collect();
        assert_eq!(
            handles,
            vec![
                (id(3), GoalState::Accepted),
                (id(1), GoalState::Executing),
                (id(2), GoalState::Accepted),
            ]
        );
    }

    #[test]
    fn finalize_drops_all_goals() {
        let clock = ManualClock::default();
        let mut server = server(&clock);
        server.accept_new_goal(id(1)).unwrap();
        server.accept_new_goal(id(2)).unwrap();
        server.finalize();
        assert_eq!(server.num_goals(), 0);
        assert!(server.status_snapshot().is_empty());
    }
}
