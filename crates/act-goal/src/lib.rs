//! # act-goal
//!
//! Goal lifecycle primitives for the action goal engine.
//!
//! An action goal is a long-running, cancelable unit of work submitted to
//! an action server. This crate holds the pieces that know nothing about
//! how many goals exist or who owns them:
//!
//! - [`GoalId`], [`Timestamp`], [`GoalInfo`] — goal identity and time
//! - [`GoalState`] / [`GoalEvent`] and [`transition`] — the pure state machine
//!   (Accepted → Executing → Canceling → Succeeded | Canceled | Aborted)
//! - [`GoalHandle`] — one goal's identity plus its current state
//! - [`Clock`] — the injected time source ([`SystemClock`], [`ManualClock`])
//!
//! Registry bookkeeping, cancellation and expiry live in `act-server`.

pub mod clock;
pub mod error;
pub mod handle;
pub mod state;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::GoalError;
pub use handle::GoalHandle;
pub use state::{transition, transition_or_unknown, GoalEvent, GoalState, StateQuery};
pub use types::{GoalId, GoalInfo, Timestamp};
