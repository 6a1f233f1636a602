//! Typed ticket records.
//!
//! Records are decoded from and encoded to fixed-size arrays so that every
//! offset is checked once, here, instead of at each call site.

use crate::layout::{PAGE_SIZE, USAGE_LOG_LEN};
use crate::types::UnixTime;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Size of the static record's MAC input in bytes.
pub const STATIC_RECORD_SIZE: usize = 20;

/// A 4-byte ASCII label (application tag or format version).
///
/// Only a zeroed page is *blank*. Any other content that is not four ASCII
/// letters, digits, or `.` is *unreadable*: it has no text, but it is still
/// somebody's data.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label([u8; PAGE_SIZE]);

/// Text that cannot be stored as a [`Label`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("label must be exactly four ASCII letters, digits or '.', got {0:?}")]
pub struct InvalidLabel(pub String);

impl Label {
    /// The blank (all-zero) label.
    pub const BLANK: Self = Self([0; PAGE_SIZE]);

    /// Wraps raw page bytes without validation.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; PAGE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a label from text.
    ///
    /// Returns `None` unless `text` is exactly four label characters.
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        let bytes = <[u8; PAGE_SIZE]>::try_from(text.as_bytes()).ok()?;
        let label = Self(bytes);
        label.is_text().then_some(label)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.0
    }

    /// Returns `true` if every byte is zero.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0 == [0; PAGE_SIZE]
    }

    /// Returns the label text, or `None` when blank or unreadable.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if !self.is_text() {
            return None;
        }
        core::str::from_utf8(&self.0).ok()
    }

    fn is_text(&self) -> bool {
        self.0.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'.')
    }
}

impl TryFrom<String> for Label {
    type Error = InvalidLabel;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::from_text(&text).ok_or(InvalidLabel(text))
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "Label({text:?})"),
            None if self.is_blank() => f.write_str("Label(blank)"),
            None => write!(f, "Label(unreadable {:02x?})", self.0),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => f.write_str(text),
            None if self.is_blank() => f.write_str("<blank>"),
            None => write!(f, "<{:02x?}>", self.0),
        }
    }
}

/// The static ticket record: written once per issue or top-up.
///
/// Its 20 encoded bytes are exactly the static MAC input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StaticTicketRecord {
    /// Application tag.
    pub app_tag: Label,
    /// Format version.
    pub version: Label,
    /// Tag counter value when this record was (re)issued.
    pub counter_state: u32,
    /// Uses granted since `counter_state` was captured.
    pub ticket_count: u32,
    /// Validity window length in days, counted from first use.
    pub valid_for_days: u32,
}

impl StaticTicketRecord {
    /// Decodes the record from its stored bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; STATIC_RECORD_SIZE]) -> Self {
        Self {
            app_tag: Label::from_bytes(word(bytes, 0)),
            version: Label::from_bytes(word(bytes, 4)),
            counter_state: u32::from_be_bytes(word(bytes, 8)),
            ticket_count: u32::from_be_bytes(word(bytes, 12)),
            valid_for_days: u32::from_be_bytes(word(bytes, 16)),
        }
    }

    /// Encodes the record into its stored bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; STATIC_RECORD_SIZE] {
        let mut out = [0u8; STATIC_RECORD_SIZE];
        out[0..4].copy_from_slice(self.app_tag.as_bytes());
        out[4..8].copy_from_slice(self.version.as_bytes());
        out[8..12].copy_from_slice(&self.counter_state.to_be_bytes());
        out[12..16].copy_from_slice(&self.ticket_count.to_be_bytes());
        out[16..20].copy_from_slice(&self.valid_for_days.to_be_bytes());
        out
    }

    /// Uses left given the tag's current counter:
    /// `max(0, counter_state + ticket_count - counter)`.
    #[must_use]
    pub fn remaining_uses(&self, counter: u32) -> u32 {
        let remaining =
            i64::from(self.counter_state) + i64::from(self.ticket_count) - i64::from(counter);
        u32::try_from(remaining.max(0)).unwrap_or(u32::MAX)
    }
}

/// The dynamic ticket record: mutated on each redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DynamicTicketRecord {
    /// First redemption; starts the validity window.
    pub first_use: Option<UnixTime>,
    /// Latest redemption; drives the double-tap cooldown.
    pub last_use: Option<UnixTime>,
}

impl DynamicTicketRecord {
    /// A record with no redemptions.
    pub const CLEARED: Self = Self {
        first_use: None,
        last_use: None,
    };

    /// Bytes covered by the dynamic MAC. Only `first_use` is protected:
    /// it alone decides expiry.
    #[must_use]
    pub const fn mac_input(&self) -> [u8; PAGE_SIZE] {
        UnixTime::encode(self.first_use)
    }

    /// When the validity window that started at first use closes.
    #[must_use]
    pub fn expires_at(&self, valid_for_days: u32) -> Option<UnixTime> {
        self.first_use.map(|first| first.add_days(valid_for_days))
    }
}

/// Fixed-size circular log of recent redemption timestamps.
///
/// There is no head pointer on the tag; the slot to overwrite is the first
/// empty one, otherwise the one holding the oldest timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageLog {
    entries: [Option<UnixTime>; USAGE_LOG_LEN],
}

impl UsageLog {
    /// Decodes the log from its stored bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; USAGE_LOG_LEN * PAGE_SIZE]) -> Self {
        let mut entries = [None; USAGE_LOG_LEN];
        for (slot, chunk) in entries.iter_mut().zip(bytes.chunks_exact(PAGE_SIZE)) {
            *slot = UnixTime::decode(word(chunk, 0));
        }
        Self { entries }
    }

    /// Encodes the log into its stored bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; USAGE_LOG_LEN * PAGE_SIZE] {
        let mut out = [0u8; USAGE_LOG_LEN * PAGE_SIZE];
        for (entry, chunk) in self.entries.iter().zip(out.chunks_exact_mut(PAGE_SIZE)) {
            chunk.copy_from_slice(&UnixTime::encode(*entry));
        }
        out
    }

    /// Raw slot contents, in slot order.
    #[must_use]
    pub const fn entries(&self) -> &[Option<UnixTime>; USAGE_LOG_LEN] {
        &self.entries
    }

    /// Recorded timestamps, newest first.
    #[must_use]
    pub fn recent(&self) -> Vec<UnixTime> {
        let mut out: Vec<UnixTime> = self.entries.iter().flatten().copied().collect();
        out.sort_unstable_by(|a, b| b.cmp(a));
        out
    }

    /// Records a redemption, evicting the oldest entry when full.
    ///
    /// Returns the slot index that changed.
    pub fn record(&mut self, at: UnixTime) -> usize {
        let slot = self
            .entries
            .iter()
            .position(Option::is_none)
            .unwrap_or_else(|| {
                self.entries
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, entry)| **entry)
                    .map_or(0, |(idx, _)| idx)
            });
        self.entries[slot] = Some(at);
        slot
    }

    /// Stored bytes of one slot.
    #[must_use]
    pub fn slot_bytes(&self, slot: usize) -> [u8; PAGE_SIZE] {
        UnixTime::encode(self.entries.get(slot).copied().flatten())
    }
}

fn word(bytes: &[u8], at: usize) -> [u8; PAGE_SIZE] {
    let mut out = [0u8; PAGE_SIZE];
    out.copy_from_slice(&bytes[at..at + PAGE_SIZE]);
    out
}
