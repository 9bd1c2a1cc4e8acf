// error.rs — Error types for the action server engine.
//
// Cancel requests that match nothing are not errors: they are reported
// through `CancelOutcome`. Everything here is a real failure surfaced to
// the immediate caller; nothing is retried.

use std::path::PathBuf;

use act_goal::{GoalError, GoalId};
use thiserror::Error;

/// Errors returned by registry, expiry and server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A goal with this id is already tracked. The registry is unchanged.
    #[error("goal id already exists: {0}")]
    DuplicateGoalId(GoalId),

    /// Growing goal storage failed. The registry is unchanged.
    #[error("goal storage allocation failed: {reason}")]
    AllocationFailure { reason: String },

    /// An operation named a goal that was never accepted (or has expired).
    #[error("unknown goal: {0}")]
    UnknownGoal(GoalId),

    /// The event is illegal for the goal's current state.
    #[error(transparent)]
    InvalidTransition(#[from] GoalError),

    /// Expired goals were requested into an output of zero capacity.
    #[error("expired goal output requested with zero capacity")]
    InvalidCapacity,

    /// A notification sink could not take an event.
    #[error("notification sink {sink} failed: {reason}")]
    SinkFailed { sink: String, reason: String },
}

/// Errors loading or validating server options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The result retention must not be negative.
    #[error("result_timeout_ns must be >= 0, got {0}")]
    NegativeRetention(i64),

    #[error("max_goals must be greater than zero")]
    ZeroGoalLimit,

    #[error("failed to render config: {0}")]
    RenderFailed(#[from] toml::ser::Error),
}
