// clock.rs — Time sources injected into the action server.
//
// The engine never reads the system time itself: every operation takes an
// explicit `now`. The server owning the engine reads one of these clocks
// once per operation. `ManualClock` stands in for an overridable simulated
// time source and is what the tests drive.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::types::Timestamp;

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time (nanoseconds since the Unix epoch).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from(Utc::now())
    }
}

/// Simulated time that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one clone and
/// hand another to the server.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            nanos: Arc::new(AtomicI64::new(start.as_nanos())),
        }
    }

    /// Jump to an arbitrary time, including backwards.
    pub fn set(&self, now: Timestamp) {
        self.nanos.store(now.as_nanos(), Ordering::SeqCst);
    }

    /// Step forward by `step` and return the new time.
    pub fn advance(&self, step: Duration) -> Timestamp {
        let next = self.now().saturating_add(step);
        self.set(next);
        next
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}
