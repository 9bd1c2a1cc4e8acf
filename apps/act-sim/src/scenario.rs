// scenario.rs — Scripted scenarios replayed against an ActionServer.
//
// A scenario is a TOML file holding a start time and an ordered list of
// steps. Time only moves on `advance` steps, so every run is
// deterministic. Failures of individual steps (a duplicate id, an illegal
// event) are recorded in the step's result rather than aborting the run.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use act_goal::{GoalEvent, GoalId, GoalInfo, GoalState, ManualClock, Timestamp};
use act_server::{
    ActionServer, CancelRequest, CancelResponse, ExpiryReport, GoalStatus, NotificationSink,
    ServerOptions,
};

/// A scripted run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_action_name")]
    pub action: String,

    /// Simulated time at the start of the run, in seconds.
    #[serde(default)]
    pub start_secs: i64,

    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_action_name() -> String {
    "scenario".to_string()
}

/// One scripted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Accept a goal stamped with the current simulated time.
    Accept { goal: GoalId },

    /// Report an execution event for a goal.
    Event { goal: GoalId, event: GoalEvent },

    /// Send a cancel request. Omit both fields to cancel everything.
    Cancel {
        #[serde(default)]
        goal: Option<GoalId>,
        #[serde(default)]
        before_secs: Option<i64>,
    },

    /// Move simulated time forward.
    Advance { secs: u64 },

    /// Expire finished goals. Omit `capacity` to count only.
    Expire {
        #[serde(default)]
        capacity: Option<usize>,
    },

    /// Take a status snapshot.
    Status,
}

/// What one step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepResult {
    Accepted { goal: GoalInfo },
    Transitioned { goal: GoalId, state: GoalState },
    Cancel { response: CancelResponse },
    Clock { now: Timestamp },
    Expired { report: ExpiryReport },
    Status { goals: Vec<GoalStatus> },
    Failed { error: String },
}

/// A step result tagged with its position and the time it ran at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub at: Timestamp,
    #[serde(flatten)]
    pub result: StepResult,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario = toml::from_str(&content)
            .with_context(|| format!("failed to parse scenario {}", path.display()))?;
        Ok(scenario)
    }

    /// Replay every step against a fresh server.
    pub fn run(&self, options: ServerOptions) -> anyhow::Result<Vec<StepRecord>> {
        self.run_with_sinks(options, Vec::new())
    }

    /// Replay every step, reporting server events to `sinks`.
    pub fn run_with_sinks(
        &self,
        options: ServerOptions,
        sinks: Vec<Box<dyn NotificationSink>>,
    ) -> anyhow::Result<Vec<StepRecord>> {
        let clock = ManualClock::new(Timestamp::from_secs(self.start_secs));
        let mut server = ActionServer::new(self.action.as_str(), options, clock.clone())
            .context("invalid server options")?;
        for sink in sinks {
            server.add_sink(sink);
        }

        let mut records = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let result = run_step(&mut server, &clock, step);
            if let StepResult::Failed { error } = &result {
                tracing::warn!(step = index, "step failed: {}", error);
            }
            records.push(StepRecord {
                step: index,
                at: server.now(),
                result,
            });
        }
        server.finalize();
        Ok(records)
    }
}

fn run_step(server: &mut ActionServer, clock: &ManualClock, step: &Step) -> StepResult {
    match step {
        Step::Accept { goal } => match server.accept_new_goal(*goal) {
            Ok(handle) => StepResult::Accepted {
                goal: *handle.info(),
            },
            Err(e) => failed(e),
        },
        Step::Event { goal, event } => match server.apply_event(*goal, *event) {
            Ok(state) => StepResult::Transitioned { goal: *goal, state },
            Err(e) => failed(e),
        },
        Step::Cancel { goal, before_secs } => {
            let request = CancelRequest {
                target_id: *goal,
                at_or_before: before_secs.map(Timestamp::from_secs),
            };
            StepResult::Cancel {
                response: server.process_cancel(&request),
            }
        }
        Step::Advance { secs } => StepResult::Clock {
            now: clock.advance(Duration::from_secs(*secs)),
        },
        Step::Expire { capacity } => match server.expire(*capacity) {
            Ok(report) => StepResult::Expired { report },
            Err(e) => failed(e),
        },
        Step::Status => StepResult::Status {
            goals: server.status_snapshot(),
        },
    }
}

fn failed(error: impl std::fmt::Display) -> StepResult {
    StepResult::Failed {
        error: error.to_string(),
    }
}
