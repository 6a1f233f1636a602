//! Truncated MAC tags stored on the tag.
//!
//! Tags are the first 4 bytes of an HMAC-SHA256 output. An all-zero stored
//! tag means "never written", which a genuine MAC hits with probability
//! 2^-32; the protocol reports it as `EmptyMac`, distinct from a wrong tag.

use crate::security::mac::MacEngine;
use std::fmt;

/// Size of a stored MAC tag in bytes.
pub const TAG_SIZE: usize = 4;

/// A truncated MAC as stored in one tag page.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacTag {
    bytes: [u8; TAG_SIZE],
}

impl MacTag {
    /// Computes the stored tag for `data`.
    #[must_use]
    pub fn compute(engine: &MacEngine, data: &[u8]) -> Self {
        let full = engine.mac(data);
        let mut bytes = [0u8; TAG_SIZE];
        bytes.copy_from_slice(&full[..TAG_SIZE]);
        Self { bytes }
    }

    /// Verifies that this tag matches the computed tag for `data`.
    ///
    /// This uses a constant-time comparison to prevent timing attacks.
    #[must_use]
    pub fn verify(&self, engine: &MacEngine, data: &[u8]) -> bool {
        let computed = Self::compute(engine, data);
        self.constant_time_eq(&computed)
    }

    /// Returns a zeroed tag: the on-tag "unset" value.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            bytes: [0u8; TAG_SIZE],
        }
    }

    /// Creates a tag from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; TAG_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the tag.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.bytes
    }

    /// Returns `true` if the stored tag is all zero (absent).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Constant-time comparison to prevent timing attacks.
    fn constant_time_eq(&self, other: &Self) -> bool {
        let mut diff = 0u8;
        for i in 0..TAG_SIZE {
            diff |= self.bytes[i] ^ other.bytes[i];
        }
        diff == 0
    }
}

impl fmt::Debug for MacTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MacTag({:02x}{:02x}{:02x}{:02x})",
            self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]
        )
    }
}
