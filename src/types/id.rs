//! Identifier and timestamp types read from and written to the tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Number of bytes read as the tag identity.
pub const UID_SIZE: usize = 8;

/// Seconds in one day of ticket validity.
pub const SECS_PER_DAY: u64 = 86_400;

/// The tag's immutable unique identifier.
///
/// Read from the first two pages at session start and used only as key
/// diversification input. It is not secret.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagUid([u8; UID_SIZE]);

impl TagUid {
    /// Creates an identifier from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; UID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parses the identifier from the bytes of a page read.
    ///
    /// Returns `None` unless `bytes` is exactly [`UID_SIZE`] long.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; UID_SIZE]>::try_from(bytes).ok().map(Self)
    }

    /// Returns the raw identifier bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; UID_SIZE] {
        &self.0
    }

    /// Returns `true` if every byte is zero, which no genuine tag reports.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Debug for TagUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagUid({self})")
    }
}

impl fmt::Display for TagUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// A Unix timestamp in whole seconds, as stored in a 4-byte tag field.
///
/// The on-tag encoding reserves zero for "unset", so a stored field decodes
/// to `Option<UnixTime>`; see [`UnixTime::decode`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct UnixTime(u32);

impl UnixTime {
    /// The epoch. Encodes as the "unset" sentinel.
    pub const ZERO: Self = Self(0);

    /// The latest representable instant.
    pub const MAX: Self = Self(u32::MAX);

    /// Creates a timestamp from seconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Creates a timestamp from 64-bit seconds, saturating at [`UnixTime::MAX`].
    #[inline]
    #[must_use]
    pub fn from_secs_saturating(secs: u64) -> Self {
        Self(u32::try_from(secs).unwrap_or(u32::MAX))
    }

    /// Returns the seconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Decodes a stored big-endian field; all-zero means unset.
    #[must_use]
    pub const fn decode(bytes: [u8; 4]) -> Option<Self> {
        match u32::from_be_bytes(bytes) {
            0 => None,
            secs => Some(Self(secs)),
        }
    }

    /// Encodes an optional timestamp into its stored big-endian field.
    #[must_use]
    pub const fn encode(time: Option<Self>) -> [u8; 4] {
        match time {
            Some(t) => t.0.to_be_bytes(),
            None => [0; 4],
        }
    }

    /// Adds a whole number of validity days, saturating on overflow.
    #[must_use]
    pub fn add_days(self, days: u32) -> Self {
        Self::from_secs_saturating(u64::from(self.0) + u64::from(days) * SECS_PER_DAY)
    }

    /// Adds a duration (whole seconds), saturating on overflow.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Self::from_secs_saturating(u64::from(self.0).saturating_add(duration.as_secs()))
    }

    /// Seconds elapsed since `earlier`; zero if `earlier` is later.
    #[inline]
    #[must_use]
    pub const fn secs_since(self, earlier: Self) -> u32 {
        self.0.saturating_sub(earlier.0)
    }

    /// The instant as a UTC calendar time.
    #[must_use]
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.0), 0)
    }

    /// Human-readable UTC rendering, as shown in status messages.
    #[must_use]
    pub fn display_utc(self) -> String {
        self.to_utc().map_or_else(
            || format!("{} (unix)", self.0),
            |at| at.format("%m/%d/%Y %H:%M UTC").to_string(),
        )
    }
}

impl fmt::Debug for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnixTime({})", self.0)
    }
}

impl fmt::Display for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
