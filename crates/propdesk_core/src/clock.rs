//! Time source for history timestamps.

use crate::model::record::Timestamp;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies "now" in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ms(&self) -> Timestamp {
        (**self).now_ms()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as Timestamp)
            .unwrap_or(0)
    }
}

/// Deterministic clock that advances by a fixed step on every read.
///
/// Clones share the same underlying time, so several services can observe
/// one timeline.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    next: Rc<Cell<Timestamp>>,
    step: Timestamp,
}

impl SteppingClock {
    pub fn new(start: Timestamp, step: Timestamp) -> Self {
        Self {
            next: Rc::new(Cell::new(start)),
            step,
        }
    }

    /// Moves the clock to `at` for the next read.
    pub fn set(&self, at: Timestamp) {
        self.next.set(at);
    }
}

impl Clock for SteppingClock {
    fn now_ms(&self) -> Timestamp {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}
