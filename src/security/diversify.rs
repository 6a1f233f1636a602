//! Per-tag key diversification.
//!
//! ```text
//! tag_key = SHA-256(master || uid)[..16]
//! ```
//!
//! A compromised tag key exposes one tag, never the master secret or its
//! siblings.

use crate::security::key::{MasterKey, TAG_KEY_SIZE, TagKey};
use crate::types::TagUid;
use sha2::{Digest, Sha256};

/// Derives per-tag keys from a master secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDiversifier {
    master: MasterKey,
}

impl KeyDiversifier {
    /// Creates a diversifier over a master secret.
    #[must_use]
    pub const fn new(master: MasterKey) -> Self {
        Self { master }
    }

    /// Derives the key for one tag. Deterministic in `(master, uid)`.
    #[must_use]
    pub fn derive(&self, uid: &TagUid) -> TagKey {
        derive(&self.master, uid)
    }
}

/// Derives the key for one tag from a master secret.
#[must_use]
pub fn derive(master: &MasterKey, uid: &TagUid) -> TagKey {
    let digest = Sha256::new()
        .chain_update(master.as_bytes())
        .chain_update(uid.as_bytes())
        .finalize();
    let mut bytes = [0u8; TAG_KEY_SIZE];
    bytes.copy_from_slice(&digest.as_slice()[..TAG_KEY_SIZE]);
    TagKey::new(bytes)
}
