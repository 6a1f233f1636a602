//! Time source abstraction.
//!
//! The protocol never reads the wall clock directly; it asks a [`Clock`]
//! carried by the ticket context. Production uses [`SystemClock`], tests use
//! the lab's virtual clock.

use crate::types::UnixTime;
use std::time::{SystemTime, UNIX_EPOCH};

/// Core trait for time providers.
pub trait Clock: Send + Sync + 'static {
    /// Current time in whole Unix seconds.
    fn now(&self) -> UnixTime;

    /// Stable identifier for tracing and diagnostics.
    fn source_id(&self) -> &'static str;
}

/// Wall-clock time source for production use.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTime {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        UnixTime::from_secs_saturating(secs)
    }

    fn source_id(&self) -> &'static str {
        "system"
    }
}
