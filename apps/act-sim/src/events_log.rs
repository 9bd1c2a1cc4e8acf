// events_log.rs — JSONL file sink for server events.
//
// Each event is appended as one JSON line. The file and its parent
// directory are created on first write.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use act_server::{NotificationSink, ServerError, ServerEvent};

/// Appends server events to a JSONL file.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn failed(&self, reason: impl ToString) -> ServerError {
        ServerError::SinkFailed {
            sink: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl NotificationSink for JsonlSink {
    fn send(&self, event: &ServerEvent) -> Result<(), ServerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.failed(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.failed(e))?;

        let json = serde_json::to_string(event).map_err(|e| self.failed(e))?;
        writeln!(file, "{}", json).map_err(|e| self.failed(e))
    }
}
