//! Wall-clock abstraction.
//!
//! Topics stamp arrival times and tables decide expiry through a [`Clock`], so
//! tests can drive time by hand with [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::EventTime;

/// Source of "now" in event-time milliseconds.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> EventTime;
}

/// Milliseconds since the Unix epoch from the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EventTime {
        current_unix_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: EventTime) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: EventTime) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> EventTime {
        self.now.load(Ordering::SeqCst)
    }
}

pub fn current_unix_millis() -> EventTime {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as EventTime)
        .unwrap_or(0)
}

/// Convert a duration to whole milliseconds, saturating at `EventTime::MAX`.
pub fn duration_millis(d: Duration) -> EventTime {
    EventTime::try_from(d.as_millis()).unwrap_or(EventTime::MAX)
}
