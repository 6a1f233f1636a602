//! Virtual time for deterministic tests.

use crate::types::{Clock, SECS_PER_DAY, UnixTime};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// A clock that only moves when told to.
///
/// Shared behind an `Arc` between the test and the ticket context, so the
/// test can advance time between operations.
#[derive(Debug, Default)]
pub struct VirtualClock {
    secs: AtomicU32,
}

impl VirtualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub const fn new(start: UnixTime) -> Self {
        Self {
            secs: AtomicU32::new(start.as_secs()),
        }
    }

    /// Moves the clock forward, saturating at [`UnixTime::MAX`].
    pub fn advance(&self, by: Duration) {
        let next = self.now().saturating_add(by);
        self.secs.store(next.as_secs(), Ordering::SeqCst);
    }

    /// Moves the clock forward by whole days.
    pub fn advance_days(&self, days: u32) {
        self.advance(Duration::from_secs(u64::from(days) * SECS_PER_DAY));
    }

    /// Sets the clock, possibly backwards.
    pub fn set(&self, to: UnixTime) {
        self.secs.store(to.as_secs(), Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> UnixTime {
        UnixTime::from_secs(self.secs.load(Ordering::SeqCst))
    }

    fn source_id(&self) -> &'static str {
        "virtual"
    }
}
