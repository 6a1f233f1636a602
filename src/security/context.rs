//! Provisioned key material for ticket operations.
//!
//! A [`KeyRing`] holds the two master secrets and the factory default key.
//! Per-tag keys are derived on demand and never stored; the ring is the only
//! place master secrets live, and it is passed explicitly into every
//! operation.

use crate::security::diversify::KeyDiversifier;
use crate::security::key::{MasterKey, TagKey};
use crate::types::TagUid;

/// Master secrets and factory key used to open tag sessions.
///
/// # Example
///
/// ```
/// use tagticket::security::{KeyRing, MasterKey};
/// use tagticket::types::TagUid;
///
/// let ring = KeyRing::new(
///     MasterKey::new(b"mac master".to_vec()).unwrap(),
///     MasterKey::new(b"auth master".to_vec()).unwrap(),
/// );
/// let uid = TagUid::new([4, 1, 2, 3, 4, 5, 6, 7]);
/// assert_ne!(ring.mac_key(&uid), ring.auth_key(&uid));
/// ```
#[derive(Debug, Clone)]
pub struct KeyRing {
    mac: KeyDiversifier,
    auth: KeyDiversifier,
    factory_key: TagKey,
}

impl KeyRing {
    /// Creates a ring from the MAC and authentication master secrets.
    #[must_use]
    pub fn new(mac_master: MasterKey, auth_master: MasterKey) -> Self {
        Self {
            mac: KeyDiversifier::new(mac_master),
            auth: KeyDiversifier::new(auth_master),
            factory_key: TagKey::factory_default(),
        }
    }

    /// Overrides the factory default key (for tag batches shipped with a
    /// non-standard transport key).
    #[must_use]
    pub fn with_factory_key(mut self, key: TagKey) -> Self {
        self.factory_key = key;
        self
    }

    /// Deterministic ring for tests.
    #[doc(hidden)]
    #[must_use]
    pub fn for_testing(seed: u8) -> Self {
        Self::new(MasterKey::from_seed(seed), MasterKey::from_seed(seed ^ 0xa5))
    }

    /// The per-tag MAC key.
    #[must_use]
    pub fn mac_key(&self, uid: &TagUid) -> TagKey {
        self.mac.derive(uid)
    }

    /// The per-tag operational authentication key.
    #[must_use]
    pub fn auth_key(&self, uid: &TagUid) -> TagKey {
        self.auth.derive(uid)
    }

    /// The key an unclaimed tag answers to.
    #[must_use]
    pub const fn factory_key(&self) -> &TagKey {
        &self.factory_key
    }
}
