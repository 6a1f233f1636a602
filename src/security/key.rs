//! Key types.
//!
//! [`TagKey`] is the 16-byte symmetric key the tag and the MAC engine use.
//! [`MasterKey`] is the long-lived secret a tag key is diversified from; it
//! never touches tag data directly.
//!
//! # Security Note
//!
//! Both types zero their material on drop. This is best-effort: copies made
//! by the transport or the compiler are out of reach.

use core::fmt;

/// Size of a tag key in bytes (128 bits).
pub const TAG_KEY_SIZE: usize = 16;

/// The factory default authentication key of an unclaimed tag.
pub const FACTORY_DEFAULT_KEY: [u8; TAG_KEY_SIZE] = *b"BREAKMEIFYOUCAN!";

/// A 128-bit symmetric key: a tag authentication key or a diversified MAC key.
///
/// # Example
///
/// ```
/// use tagticket::security::{TagKey, TAG_KEY_SIZE};
///
/// let bytes = [0x42u8; TAG_KEY_SIZE];
/// let key = TagKey::new(bytes);
/// assert_eq!(key.as_bytes(), &bytes);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct TagKey {
    bytes: [u8; TAG_KEY_SIZE],
}

impl TagKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; TAG_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a key from a slice; `None` unless it is exactly 16 bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; TAG_KEY_SIZE]>::try_from(bytes).ok().map(Self::new)
    }

    /// The factory default key every blank tag ships with.
    #[must_use]
    pub const fn factory_default() -> Self {
        Self::new(FACTORY_DEFAULT_KEY)
    }

    /// Returns the key as a byte array.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TAG_KEY_SIZE] {
        &self.bytes
    }

    /// Creates a zeroed key (useful for testing error paths).
    #[doc(hidden)]
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            bytes: [0u8; TAG_KEY_SIZE],
        }
    }
}

impl fmt::Debug for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Don't expose key material in debug output
        write!(
            f,
            "TagKey([{:02x}{:02x}...{:02x}{:02x}])",
            self.bytes[0],
            self.bytes[1],
            self.bytes[TAG_KEY_SIZE - 2],
            self.bytes[TAG_KEY_SIZE - 1]
        )
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagKey({:02x}{:02x}...)", self.bytes[0], self.bytes[1])
    }
}

impl Drop for TagKey {
    fn drop(&mut self) {
        for byte in &mut self.bytes {
            *byte = 0;
        }
    }
}

/// A master secret from which per-tag keys are diversified.
///
/// Any length is accepted; provisioning decides the size. Empty secrets are
/// rejected at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey {
    bytes: Vec<u8>,
}

impl MasterKey {
    /// Wraps secret material. Returns `None` for an empty secret.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = bytes.into();
        (!bytes.is_empty()).then_some(Self { bytes })
    }

    /// Deterministic 16-byte secret for tests.
    #[doc(hidden)]
    #[must_use]
    pub fn from_seed(seed: u8) -> Self {
        Self {
            bytes: (0..16u8).map(|i| seed.wrapping_mul(31).wrapping_add(i)).collect(),
        }
    }

    /// Returns the secret bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the secret in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; empty secrets cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey({} bytes)", self.bytes.len())
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        for byte in &mut self.bytes {
            *byte = 0;
        }
    }
}
