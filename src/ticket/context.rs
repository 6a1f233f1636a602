//! Shared context for ticket operations.

use crate::config::{ConfigError, TicketConfig};
use crate::error::{TicketError, TicketResult};
use crate::security::KeyRing;
use crate::session::Session;
use crate::tracing_compat::{info, warn};
use crate::transport::TagTransport;
use crate::types::{Clock, UnixTime};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for operations run through one context.
#[derive(Debug, Default)]
pub struct TicketStats {
    /// Fresh issues written.
    pub issued: AtomicU64,
    /// Top-ups written.
    pub topped_up: AtomicU64,
    /// Uses accepted.
    pub validated: AtomicU64,
    /// Operations that returned an error.
    pub rejected: AtomicU64,
    /// Rejections for `EmptyMac` or `InvalidMac`.
    pub integrity_failures: AtomicU64,
}

impl TicketStats {
    pub(crate) fn record_rejection(&self, err: &TicketError) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        if err.is_integrity_failure() {
            self.integrity_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Keys, policy, and time source for ticket operations.
///
/// One context serves any number of tags; per-tag state lives in the
/// [`Session`] each operation opens.
pub struct TicketContext {
    keys: KeyRing,
    config: TicketConfig,
    clock: Arc<dyn Clock>,
    stats: TicketStats,
}

impl TicketContext {
    /// Creates a context. The configuration is taken as is.
    #[must_use]
    pub fn new(keys: KeyRing, config: TicketConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys,
            config,
            clock,
            stats: TicketStats::default(),
        }
    }

    /// Creates a context after validating the configuration.
    pub fn try_new(
        keys: KeyRing,
        config: TicketConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(keys, config, clock))
    }

    /// Provisioned keys.
    #[must_use]
    pub const fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Ticket policy.
    #[must_use]
    pub const fn config(&self) -> &TicketConfig {
        &self.config
    }

    /// Current time from the context's clock.
    #[must_use]
    pub fn now(&self) -> UnixTime {
        self.clock.now()
    }

    /// Operation counters.
    #[must_use]
    pub const fn stats(&self) -> &TicketStats {
        &self.stats
    }

    /// Opens an authenticated session with a tag.
    pub fn open_session<'t, T>(&self, transport: &'t mut T) -> TicketResult<Session<'t, T>>
    where
        T: TagTransport + ?Sized,
    {
        Session::open(transport, &self.keys)
    }

    /// Logs and counts a failed operation.
    #[cfg_attr(not(feature = "tracing-integration"), allow(unused_variables))]
    pub(crate) fn note_rejection(&self, operation: &'static str, err: &TicketError) {
        self.stats.record_rejection(err);
        let kind = err.kind();
        if kind.is_integrity_failure() || kind.is_io_failure() {
            warn!(operation, kind = ?kind, error = %err, "ticket operation failed");
        } else {
            info!(operation, kind = ?kind, error = %err, "ticket operation rejected");
        }
    }
}

impl fmt::Debug for TicketContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketContext")
            .field("config", &self.config)
            .field("clock", &self.clock.source_id())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
