//! # act-server
//!
//! Goal bookkeeping for an action server.
//!
//! An action server tracks every goal submitted to it, processes cancel
//! requests, expires finished goals after a retention window, and produces
//! status snapshots. This crate does all of that in memory and returns plain
//! data; moving requests and responses over a network is left to the caller.
//!
//! ## Key components
//!
//! - [`GoalRegistry`] — acceptance-ordered set of goal handles, unique by id
//! - [`cancel::process`] — cancel-by-id / by-time / all selection
//! - [`expiry::expire`] and [`ExpiryTimer`] — retention-based cleanup
//! - [`status::snapshot`] — ordered `(info, state)` report
//! - [`ActionServer`] — owns the above plus a clock, options and event sinks
//! - [`ServerEvent`] / [`EventDispatcher`] — change notifications
//!
//! ## Quick Example
//!
//! ```rust
//! use std::time::Duration;
//! use act_goal::{GoalEvent, GoalId, ManualClock, Timestamp};
//! use act_server::{ActionServer, CancelRequest, ServerOptions};
//!
//! let clock = ManualClock::new(Timestamp::from_secs(1));
//! let options = ServerOptions::default().with_retention(Duration::from_secs(60));
//! let mut server = ActionServer::new("navigate", options, clock.clone()).unwrap();
//!
//! let goal = GoalId::random();
//! server.accept_new_goal(goal).unwrap();
//! server.apply_event(goal, GoalEvent::Execute).unwrap();
//!
//! let response = server.process_cancel(&CancelRequest::goal(goal));
//! assert_eq!(response.canceling.len(), 1);
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod events;
pub mod expiry;
pub mod registry;
pub mod server;
pub mod status;

pub use cancel::{CancelOutcome, CancelRequest, CancelResponse};
pub use config::ServerOptions;
pub use error::{ConfigError, ServerError};
pub use events::{EventDispatcher, NotificationSink, ServerEvent};
pub use expiry::{ExpiryReport, ExpiryTimer};
pub use registry::GoalRegistry;
pub use server::ActionServer;
pub use status::GoalStatus;
