//! Tag authentication and the one-time claim transition.
//!
//! A tag leaves the factory answering to a well-known default key. The first
//! party to authenticate with that key rotates it to the per-tag operational
//! key and thereby *claims* the tag:
//!
//! ```text
//!             rotate key + re-auth OK
//!  Unclaimed ─────────────────────────► Claimed
//!      ▲  │
//!      └──┘ rotation write or re-auth fails (factory key still valid)
//! ```
//!
//! There is no way back from `Claimed`.

use crate::error::{TicketError, TicketResult};
use crate::layout::{KEY_PAGE, KEY_PAGE_COUNT};
use crate::security::{KeyRing, TagKey};
use crate::tracing_compat::{debug, error, info};
use crate::transport::TagTransport;
use crate::types::TagUid;
use serde::Serialize;

/// Which key a tag answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClaimState {
    /// The tag still answers to the factory default key.
    Unclaimed,
    /// The tag answers to its diversified operational key.
    Claimed,
}

/// How a session got authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Authenticated {
    /// The operational key was accepted directly.
    Operational,
    /// The tag was unclaimed and has just been claimed.
    NewlyClaimed,
}

/// Establishes authenticated sessions, claiming factory-fresh tags.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticationManager<'a> {
    keys: &'a KeyRing,
}

impl<'a> AuthenticationManager<'a> {
    /// Creates a manager over provisioned keys.
    #[must_use]
    pub const fn new(keys: &'a KeyRing) -> Self {
        Self { keys }
    }

    /// Authenticates the session, claiming the tag if it is unclaimed.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailure` if neither key is accepted, or if the tag is
    /// unclaimed and the claim does not complete.
    pub fn authenticate<T>(&self, transport: &mut T, uid: &TagUid) -> TicketResult<Authenticated>
    where
        T: TagTransport + ?Sized,
    {
        let operational = self.keys.auth_key(uid);
        if transport.authenticate(&operational).is_ok() {
            debug!(uid = %uid, "authenticated with operational key");
            return Ok(Authenticated::Operational);
        }

        if !self.accepts_factory_key(transport, uid) {
            return Err(rejected_every_key());
        }
        self.claim_with(transport, uid, &operational)?;
        Ok(Authenticated::NewlyClaimed)
    }

    /// Reports which key the tag answers to, without changing anything.
    ///
    /// Leaves the tag authenticated with whichever key it accepted.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailure` if the tag accepts neither key.
    pub fn claim_state<T>(&self, transport: &mut T, uid: &TagUid) -> TicketResult<ClaimState>
    where
        T: TagTransport + ?Sized,
    {
        if transport.authenticate(&self.keys.auth_key(uid)).is_ok() {
            return Ok(ClaimState::Claimed);
        }
        if self.accepts_factory_key(transport, uid) {
            Ok(ClaimState::Unclaimed)
        } else {
            Err(rejected_every_key())
        }
    }

    /// Performs the `Unclaimed → Claimed` transition on a tag that is
    /// currently authenticated with the factory key.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailure` if the key write fails or the tag does not
    /// accept the new key afterwards. The tag is then still `Unclaimed`.
    pub fn claim<T>(&self, transport: &mut T, uid: &TagUid) -> TicketResult<()>
    where
        T: TagTransport + ?Sized,
    {
        self.claim_with(transport, uid, &self.keys.auth_key(uid))
    }

    #[cfg_attr(not(feature = "tracing-integration"), allow(unused_variables))]
    fn accepts_factory_key<T>(&self, transport: &mut T, uid: &TagUid) -> bool
    where
        T: TagTransport + ?Sized,
    {
        if transport.authenticate(self.keys.factory_key()).is_ok() {
            debug!(uid = %uid, "tag answers to the factory key");
            true
        } else {
            error!(uid = %uid, "authentication failed with every known key");
            false
        }
    }

    #[cfg_attr(not(feature = "tracing-integration"), allow(unused_variables))]
    fn claim_with<T>(&self, transport: &mut T, uid: &TagUid, key: &TagKey) -> TicketResult<()>
    where
        T: TagTransport + ?Sized,
    {
        if let Err(err) = transport.write_pages(key.as_bytes(), KEY_PAGE, KEY_PAGE_COUNT) {
            error!(uid = %uid, error = %err, "key rotation write failed");
            return Err(TicketError::authentication_failure()
                .with_context(format!("key rotation write failed: {err}")));
        }
        if let Err(err) = transport.authenticate(key) {
            error!(uid = %uid, error = %err, "rotated key not accepted");
            return Err(TicketError::authentication_failure()
                .with_context(format!("rotated key not accepted: {err}")));
        }
        info!(uid = %uid, "tag claimed, operational key installed");
        Ok(())
    }
}

fn rejected_every_key() -> TicketError {
    TicketError::authentication_failure()
        .with_context("tag rejected both the operational and the factory key")
}
