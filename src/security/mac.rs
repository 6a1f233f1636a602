//! Keyed MAC engine (HMAC-SHA256).
//!
//! The engine returns the full 32-byte HMAC. Truncation to the 4 bytes that
//! fit on the tag happens in [`MacTag`](crate::security::MacTag); the byte
//! ranges fed in are part of the protocol and must be identical on the
//! issuing and validating side.

use crate::error::{TicketError, TicketResult};
use crate::security::key::TagKey;
use core::fmt;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Size of a full MAC output in bytes.
pub const MAC_OUTPUT_SIZE: usize = 32;

/// HMAC-SHA256 keyed with a per-tag diversified key.
#[derive(Clone)]
pub struct MacEngine {
    keyed: HmacSha256,
}

impl MacEngine {
    /// Creates an engine keyed with `key`.
    pub fn new(key: &TagKey) -> TicketResult<Self> {
        Ok(Self {
            keyed: keyed_hmac(key)?,
        })
    }

    /// Replaces the key. Every MAC computed afterwards uses the new key.
    pub fn set_key(&mut self, key: &TagKey) -> TicketResult<()> {
        self.keyed = keyed_hmac(key)?;
        Ok(())
    }

    /// Computes the full MAC over `data`.
    #[must_use]
    pub fn mac(&self, data: &[u8]) -> [u8; MAC_OUTPUT_SIZE] {
        let mut mac = self.keyed.clone();
        mac.update(data);
        let digest = mac.finalize().into_bytes();
        let mut out = [0u8; MAC_OUTPUT_SIZE];
        out.copy_from_slice(digest.as_slice());
        out
    }
}

impl fmt::Debug for MacEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MacEngine(HMAC-SHA256)")
    }
}

fn keyed_hmac(key: &TagKey) -> TicketResult<HmacSha256> {
    <HmacSha256 as KeyInit>::new_from_slice(key.as_bytes()).map_err(|e| {
        TicketError::authentication_failure().with_context(format!("MAC key rejected: {e}"))
    })
}
