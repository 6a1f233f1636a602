//! One authenticated conversation with one tag.
//!
//! A [`Session`] is opened per tap: it reads the UID, authenticates
//! (claiming the tag if needed), and keys a [`MacEngine`] with the tag's
//! diversified MAC key. Everything an operation needs about the tag travels
//! in the session value; nothing is kept between calls.
//!
//! ```text
//! READ_UID ──► AUTHENTICATE ──► REKEY ──► (operation reads / writes)
//! ```

pub mod auth;

pub use auth::{Authenticated, AuthenticationManager, ClaimState};

use crate::error::{TicketError, TicketResult};
use crate::layout::{
    COUNTER_INCREMENT, COUNTER_PAGE, PAGE_SIZE, REGION_PAGE_COUNT, TICKET_START_PAGE, TicketImage,
    UID_PAGE, UID_PAGE_COUNT,
};
use crate::security::{KeyRing, MacEngine};
use crate::tracing_compat::{debug, warn};
use crate::transport::TagTransport;
use crate::types::TagUid;

/// An authenticated session with a tag.
pub struct Session<'t, T: TagTransport + ?Sized> {
    transport: &'t mut T,
    uid: TagUid,
    mac: MacEngine,
    authenticated: Authenticated,
}

impl<'t, T: TagTransport + ?Sized> Session<'t, T> {
    /// Opens a session: read UID, authenticate, key the MAC engine.
    ///
    /// # Errors
    ///
    /// `ReadFailure` if the UID cannot be read or is empty;
    /// `AuthenticationFailure` if the tag cannot be authenticated.
    pub fn open(transport: &'t mut T, keys: &KeyRing) -> TicketResult<Self> {
        let uid = read_uid(transport)?;
        let authenticated = AuthenticationManager::new(keys).authenticate(transport, &uid)?;
        let mac = MacEngine::new(&keys.mac_key(&uid))?;
        debug!(uid = %uid, auth = ?authenticated, "session opened");
        Ok(Self {
            transport,
            uid,
            mac,
            authenticated,
        })
    }

    /// The tag's UID.
    #[must_use]
    pub const fn uid(&self) -> &TagUid {
        &self.uid
    }

    /// MAC engine keyed for this tag.
    #[must_use]
    pub const fn mac(&self) -> &MacEngine {
        &self.mac
    }

    /// How the session was authenticated.
    #[must_use]
    pub const fn authenticated(&self) -> Authenticated {
        self.authenticated
    }

    /// Reads raw pages.
    pub fn read_pages(&mut self, start: u8, count: u8, what: &str) -> TicketResult<Vec<u8>> {
        self.transport
            .read_pages(start, count)
            .map_err(|err| err.into_read_failure(what))
    }

    /// Reads and decodes the whole ticket region in one call.
    pub fn read_image(&mut self) -> TicketResult<TicketImage> {
        let bytes = self.read_pages(TICKET_START_PAGE, REGION_PAGE_COUNT, "ticket region")?;
        TicketImage::from_region(&bytes)
    }

    /// Writes pages; failure aborts the operation.
    pub fn write(&mut self, data: &[u8], start: u8, what: &str) -> TicketResult<()> {
        let count = page_count(data.len(), what)?;
        self.transport
            .write_pages(data, start, count)
            .map_err(|err| {
                warn!(uid = %self.uid, page = start, error = %err, "write failed: {what}");
                err.into_write_failure(what)
            })
    }

    /// Writes pages whose loss carries no security weight. Returns whether
    /// the write landed; a failure is logged once, here.
    #[cfg_attr(not(feature = "tracing-integration"), allow(unused_variables))]
    pub fn write_best_effort(&mut self, data: &[u8], start: u8, what: &str) -> bool {
        let landed = page_count(data.len(), what).and_then(|count| {
            self.transport
                .write_pages(data, start, count)
                .map_err(|err| err.into_write_failure(what))
        });
        match landed {
            Ok(()) => true,
            Err(err) => {
                warn!(uid = %self.uid, page = start, error = %err, "best-effort write dropped: {what}");
                false
            }
        }
    }

    /// Advances the hardware counter by exactly one.
    pub fn increment_counter(&mut self) -> TicketResult<()> {
        self.write(&COUNTER_INCREMENT, COUNTER_PAGE, "counter increment")
    }
}

impl<T: TagTransport + ?Sized> core::fmt::Debug for Session<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.uid)
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

/// Reads the tag's UID. No authentication needed.
pub fn read_uid<T: TagTransport + ?Sized>(transport: &mut T) -> TicketResult<TagUid> {
    let bytes = transport
        .read_pages(UID_PAGE, UID_PAGE_COUNT)
        .map_err(|err| err.into_read_failure("UID"))?;
    let uid = TagUid::from_slice(&bytes).ok_or_else(|| {
        TicketError::read_failure().with_context(format!("UID: got {} bytes", bytes.len()))
    })?;
    if uid.is_zero() {
        return Err(TicketError::read_failure().with_context("UID: empty"));
    }
    Ok(uid)
}

fn page_count(len: usize, what: &str) -> TicketResult<u8> {
    if len == 0 || len % PAGE_SIZE != 0 {
        return Err(TicketError::write_failure()
            .with_context(format!("{what}: {len} bytes is not a whole number of pages")));
    }
    u8::try_from(len / PAGE_SIZE).map_err(|_| {
        TicketError::write_failure().with_context(format!("{what}: {len} bytes is too long"))
    })
}
