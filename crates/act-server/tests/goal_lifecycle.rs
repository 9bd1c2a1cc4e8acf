// goal_lifecycle.rs — End-to-end tests of an action server's goal bookkeeping.
//
// These drive an ActionServer through a simulated clock exactly the way
// transport handlers would: accept goals, report execution progress,
// process cancel requests, publish status, and expire finished goals.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use act_goal::{GoalEvent, GoalId, GoalInfo, GoalState, ManualClock, Timestamp};
use act_server::{
    ActionServer, CancelOutcome, CancelRequest, GoalStatus, NotificationSink, ServerError,
    ServerEvent, ServerOptions,
};

const RETENTION: Duration = Duration::from_secs(30);

fn new_server(clock: &ManualClock) -> ActionServer {
    let options = ServerOptions::default().with_retention(RETENTION);
    ActionServer::new("test_action", options, clock.clone()).unwrap()
}

fn goal(n: u8) -> GoalId {
    GoalId::from_bytes([n; 16])
}

/// The canonical lifecycle: accept → execute → cancel → canceled → expire.
#[test]
fn single_goal_cancel_then_expire() {
    let clock = ManualClock::new(Timestamp::ZERO);
    let mut server = new_server(&clock);
    let g1 = goal(1);

    // Accept at t=0.
    let handle = server.accept_new_goal(g1).unwrap();
    assert_eq!(handle.status(), GoalState::Accepted);
    let g1_info = *handle.info();
    assert_eq!(g1_info.accepted_at, Timestamp::ZERO);

    // Start executing.
    clock.set(Timestamp::from_secs(1));
    assert_eq!(server.apply_event(g1, GoalEvent::Execute).unwrap(), GoalState::Executing);

    // Requester asks to cancel it.
    clock.set(Timestamp::from_secs(2));
    let response = server.process_cancel(&CancelRequest::goal(g1));
    assert_eq!(response.outcome, CancelOutcome::None);
    assert_eq!(response.canceling, vec![g1_info]);
    assert_eq!(server.get_goal(&g1).unwrap().status(), GoalState::Canceling);

    // Executor acknowledges the cancel.
    let t_cancel = Timestamp::from_secs(3);
    clock.set(t_cancel);
    assert_eq!(server.apply_event(g1, GoalEvent::Canceled).unwrap(), GoalState::Canceled);
    assert_eq!(server.get_goal(&g1).unwrap().terminal_at(), Some(t_cancel));
    assert_eq!(
        server.expiry_timer().deadline(),
        Some(t_cancel.saturating_add(RETENTION))
    );

    // One nanosecond before the deadline nothing expires.
    clock.set(Timestamp::from_nanos(
        t_cancel.saturating_add(RETENTION).as_nanos() - 1,
    ));
    let report = server.expire(Some(4)).unwrap();
    assert_eq!(report.total, 0);
    assert!(report.expired.is_empty());
    assert_eq!(server.num_goals(), 1);

    // At the deadline the goal is gone.
    clock.set(t_cancel.saturating_add(RETENTION));
    let report = server.expire(Some(4)).unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.expired, vec![g1_info]);
    assert_eq!(server.num_goals(), 0);
    assert!(!server.goal_exists(&g1));
}

#[test]
fn duplicate_accept_is_rejected_and_registry_unchanged() {
    let clock = ManualClock::new(Timestamp::from_secs(1));
    let mut server = new_server(&clock);
    server.accept_new_goal(goal(1)).unwrap();

    clock.set(Timestamp::from_secs(2));
    let result = server.accept_new_goal(goal(1));
    assert!(matches!(result, Err(ServerError::DuplicateGoalId(_))));
    assert_eq!(
        server.status_snapshot(),
        vec![GoalStatus {
            info: GoalInfo::new(goal(1), Timestamp::from_secs(1)),
            status: GoalState::Accepted,
        }]
    );
}

#[test]
fn bounded_server_reports_allocation_failure() {
    let clock = ManualClock::default();
    let options = ServerOptions::default().with_max_goals(2);
    let mut server = ActionServer::new("bounded", options, clock.clone()).unwrap();

    server.accept_new_goal(goal(1)).unwrap();
    server.accept_new_goal(goal(2)).unwrap();
    let result = server.accept_new_goal(goal(3));
    assert!(matches!(result, Err(ServerError::AllocationFailure { .. })));
    assert_eq!(server.num_goals(), 2);
}

/// Ten goals accepted one second apart; cancel everything at or before t7.
#[test]
fn cancel_by_time_over_ten_goals() {
    let clock = ManualClock::new(Timestamp::ZERO);
    let mut server = new_server(&clock);
    let mut infos = Vec::new();
    for n in 0..10u8 {
        clock.set(Timestamp::from_secs(n as i64 + 1));
        infos.push(*server.accept_new_goal(goal(n + 1)).unwrap().info());
    }

    let response = server.process_cancel(&CancelRequest::at_or_before(infos[7].accepted_at));
    assert_eq!(response.outcome, CancelOutcome::None);
    assert_eq!(response.canceling, infos[..8].to_vec());

    let states: Vec<GoalState> = server.status_snapshot().iter().map(|s| s.status).collect();
    assert_eq!(&states[..8], &[GoalState::Canceling; 8]);
    assert_eq!(&states[8..], &[GoalState::Accepted; 2]);
}

/// The status snapshot always matches the true set of goals.
#[test]
fn snapshot_tracks_every_mutation() {
    let clock = ManualClock::new(Timestamp::from_secs(1));
    let mut server = new_server(&clock);

    for n in 1..=4 {
        server.accept_new_goal(goal(n)).unwrap();
    }
    server.apply_event(goal(1), GoalEvent::Execute).unwrap();
    server.apply_event(goal(1), GoalEvent::Succeed).unwrap();
    server.apply_event(goal(2), GoalEvent::Execute).unwrap();
    server.apply_event(goal(2), GoalEvent::Abort).unwrap();
    server.process_cancel(&CancelRequest::goal(goal(3)));
    assert!(server.apply_event(goal(4), GoalEvent::Succeed).is_err());

    let expected = |ids: &[(u8, GoalState)]| -> Vec<(GoalId, GoalState)> {
        ids.iter().map(|(n, s)| (goal(*n), *s)).collect()
    };
    let actual = |server: &ActionServer| -> Vec<(GoalId, GoalState)> {
        server
            .status_snapshot()
            .iter()
            .map(|s| (s.info.id, s.status))
            .collect()
    };

    assert_eq!(
        actual(&server),
        expected(&[
            (1, GoalState::Succeeded),
            (2, GoalState::Aborted),
            (3, GoalState::Canceling),
            (4, GoalState::Accepted),
        ])
    );

    clock.advance(RETENTION);
    assert_eq!(server.expire_count_only().unwrap(), 2);
    assert_eq!(
        actual(&server),
        expected(&[(3, GoalState::Canceling), (4, GoalState::Accepted)])
    );
}

/// Shared in-memory event log.
#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<ServerEvent>>>);

impl NotificationSink for EventLog {
    fn send(&self, event: &ServerEvent) -> Result<(), ServerError> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[test]
fn every_mutation_is_reported_to_sinks() {
    let clock = ManualClock::new(Timestamp::from_secs(1));
    let options = ServerOptions::default().with_retention(Duration::ZERO);
    let mut server = ActionServer::new("observed", options, clock.clone()).unwrap();
    let log = EventLog::default();
    server.add_sink(Box::new(log.clone()));

    server.accept_new_goal(goal(1)).unwrap();
    server.apply_event(goal(1), GoalEvent::Execute).unwrap();
    server.process_cancel(&CancelRequest::all());
    server.apply_event(goal(1), GoalEvent::Canceled).unwrap();
    server.expire(Some(1)).unwrap();

    let events = log.0.lock().unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "goal_accepted",
            "goal_state_changed",
            "cancel_processed",
            "goal_state_changed",
            "goals_expired",
        ]
    );
    assert!(events.iter().all(|e| e.at() == Timestamp::from_secs(1)));
    assert_eq!(
        events[4],
        ServerEvent::GoalsExpired {
            goal_ids: vec![goal(1)],
            total: 1,
            at: Timestamp::from_secs(1),
        }
    );
}

/// Embedders sharing a server across threads serialize calls with one lock.
#[test]
fn server_behind_a_mutex_keeps_ids_unique() {
    let clock = ManualClock::new(Timestamp::from_secs(1));
    let server = Arc::new(Mutex::new(new_server(&clock)));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let server = Arc::clone(&server);
            thread::spawn(move || {
                let mut accepted = 0;
                for n in 0..50u8 {
                    let mut server = server.lock().unwrap();
                    if server.accept_new_goal(goal(n)).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let total: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
    assert_eq!(total, 50);
    assert_eq!(server.lock().unwrap().num_goals(), 50);
}
