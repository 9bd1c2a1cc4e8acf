//! Action server configuration.
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! result_timeout_ns = 900_000_000_000
//! max_goals = 256
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options for one action server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOptions {
    /// How long a finished goal is kept before it expires, in nanoseconds.
    /// Signed so a bad value can be reported instead of silently wrapping.
    #[serde(default = "default_result_timeout_ns")]
    pub result_timeout_ns: i64,

    /// Upper bound on tracked goals. Accepting past it fails with an
    /// allocation failure. `None` means bounded only by memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_goals: Option<usize>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            result_timeout_ns: default_result_timeout_ns(),
            max_goals: None,
        }
    }
}

// 15 minutes.
fn default_result_timeout_ns() -> i64 {
    15 * 60 * 1_000_000_000
}

impl ServerOptions {
    /// Load and validate options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let options: ServerOptions =
            toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source,
            })?;
        options.validate()?;
        Ok(options)
    }

    /// Load options, falling back to defaults if the file doesn't exist.
    /// A file that exists but is invalid is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.result_timeout_ns < 0 {
            return Err(ConfigError::NegativeRetention(self.result_timeout_ns));
        }
        if self.max_goals == Some(0) {
            return Err(ConfigError::ZeroGoalLimit);
        }
        Ok(())
    }

    /// The retention window as a duration. Negative values clamp to zero;
    /// `validate` rejects them before a server is built.
    pub fn retention(&self) -> Duration {
        Duration::from_nanos(u64::try_from(self.result_timeout_ns).unwrap_or(0))
    }

    /// Set the retention window. Exact up to roughly 292 years; longer
    /// windows saturate.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.result_timeout_ns = i64::try_from(retention.as_nanos()).unwrap_or(i64::MAX);
        self
    }

    pub fn with_max_goals(mut self, max_goals: usize) -> Self {
        self.max_goals = Some(max_goals);
        self
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
