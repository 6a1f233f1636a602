//! Decoded view of one ticket region read.

use crate::config::TicketConfig;
use crate::error::{TicketError, TicketResult};
use crate::layout::record::{DynamicTicketRecord, STATIC_RECORD_SIZE, StaticTicketRecord, UsageLog};
use crate::layout::{Field, PAGE_SIZE, REGION_SIZE, USAGE_LOG_LEN};
use crate::security::{AuthenticatedRecord, MacEngine, MacTag};
use crate::types::UnixTime;

/// How a region read relates to this application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    /// No readable application tag: never issued, or formatted.
    Blank,
    /// Another application's tag.
    Foreign,
    /// Our application tag, another format version.
    VersionMismatch,
    /// Our application tag and version; MACs still unchecked.
    Ours,
}

/// Every field of the ticket region, decoded from one 16-page read.
///
/// Nothing here is trusted until the MACs are checked; see
/// [`TicketImage::static_authenticated`] and
/// [`TicketImage::dynamic_authenticated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketImage {
    /// Static record (application, version, grant).
    pub static_record: StaticTicketRecord,
    /// Stored static MAC.
    pub static_mac: MacTag,
    /// Dynamic record (first and last use).
    pub dynamic: DynamicTicketRecord,
    /// Stored dynamic MAC.
    pub dynamic_mac: MacTag,
    /// Recent redemptions.
    pub usage_log: UsageLog,
    /// Raw lock bytes.
    pub lock: [u8; PAGE_SIZE],
    /// Hardware counter value.
    pub counter: u32,
}

impl TicketImage {
    /// Decodes a region read.
    ///
    /// # Errors
    ///
    /// `ReadFailure` if the transport returned the wrong number of bytes.
    pub fn from_region(bytes: &[u8]) -> TicketResult<Self> {
        if bytes.len() != REGION_SIZE {
            return Err(TicketError::read_failure().with_context(format!(
                "ticket region: expected {REGION_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let mut static_bytes = [0u8; STATIC_RECORD_SIZE];
        static_bytes.copy_from_slice(&bytes[super::STATIC_MAC_INPUT]);
        let mut log_bytes = [0u8; USAGE_LOG_LEN * PAGE_SIZE];
        log_bytes.copy_from_slice(&bytes[Field::UsageLog.range()]);

        Ok(Self {
            static_record: StaticTicketRecord::from_bytes(&static_bytes),
            static_mac: MacTag::from_bytes(word(bytes, Field::StaticMac)),
            dynamic: DynamicTicketRecord {
                first_use: UnixTime::decode(word(bytes, Field::FirstUse)),
                last_use: UnixTime::decode(word(bytes, Field::LastUse)),
            },
            dynamic_mac: MacTag::from_bytes(word(bytes, Field::DynamicMac)),
            usage_log: UsageLog::from_bytes(&log_bytes),
            lock: word(bytes, Field::Lock),
            counter: u32::from_le_bytes(word(bytes, Field::TagCounter)),
        })
    }

    /// Encodes the image back into region bytes.
    #[must_use]
    pub fn to_region(&self) -> [u8; REGION_SIZE] {
        let mut out = [0u8; REGION_SIZE];
        out[..Field::FirstUse.offset()].copy_from_slice(&self.static_pages());
        out[Field::FirstUse.offset()..Field::UsageLog.offset()]
            .copy_from_slice(&self.dynamic_pages());
        out[Field::UsageLog.range()].copy_from_slice(&self.usage_log.to_bytes());
        out[Field::Lock.range()].copy_from_slice(&self.lock);
        out[Field::TagCounter.range()].copy_from_slice(&self.counter.to_le_bytes());
        out
    }

    /// Bytes of pages appTag through staticMac.
    #[must_use]
    pub fn static_pages(&self) -> [u8; STATIC_RECORD_SIZE + PAGE_SIZE] {
        let mut out = [0u8; STATIC_RECORD_SIZE + PAGE_SIZE];
        out[..STATIC_RECORD_SIZE].copy_from_slice(&self.static_record.to_bytes());
        out[STATIC_RECORD_SIZE..].copy_from_slice(self.static_mac.as_bytes());
        out
    }

    /// Bytes of pages firstUse through dynamicMac.
    #[must_use]
    pub fn dynamic_pages(&self) -> [u8; 3 * PAGE_SIZE] {
        let mut out = [0u8; 3 * PAGE_SIZE];
        out[0..4].copy_from_slice(&UnixTime::encode(self.dynamic.first_use));
        out[4..8].copy_from_slice(&UnixTime::encode(self.dynamic.last_use));
        out[8..12].copy_from_slice(self.dynamic_mac.as_bytes());
        out
    }

    /// Classifies the region against the configured application.
    #[must_use]
    pub fn classify(&self, config: &TicketConfig) -> RecordClass {
        let record = &self.static_record;
        if record.app_tag.is_blank() {
            RecordClass::Blank
        } else if record.app_tag != config.app_tag {
            RecordClass::Foreign
        } else if record.version != config.version {
            RecordClass::VersionMismatch
        } else {
            RecordClass::Ours
        }
    }

    /// The static record paired with its stored MAC, unverified.
    #[must_use]
    pub const fn static_authenticated(&self) -> AuthenticatedRecord<StaticTicketRecord> {
        AuthenticatedRecord::from_parts(self.static_record, self.static_mac)
    }

    /// The dynamic record paired with its stored MAC, unverified.
    #[must_use]
    pub const fn dynamic_authenticated(&self) -> AuthenticatedRecord<DynamicTicketRecord> {
        AuthenticatedRecord::from_parts(self.dynamic, self.dynamic_mac)
    }

    /// Replaces the static record and signs it.
    pub fn set_static(&mut self, engine: &MacEngine, record: StaticTicketRecord) {
        let (record, tag) = AuthenticatedRecord::sign(engine, record).into_parts();
        self.static_record = record;
        self.static_mac = tag;
    }

    /// Replaces the dynamic record and signs it.
    pub fn set_dynamic(&mut self, engine: &MacEngine, record: DynamicTicketRecord) {
        let (record, tag) = AuthenticatedRecord::sign(engine, record).into_parts();
        self.dynamic = record;
        self.dynamic_mac = tag;
    }

    /// Uses left at the current counter.
    #[must_use]
    pub fn remaining_uses(&self) -> u32 {
        self.static_record.remaining_uses(self.counter)
    }

    /// End of the validity window, once started.
    #[must_use]
    pub fn expires_at(&self) -> Option<UnixTime> {
        self.dynamic.expires_at(self.static_record.valid_for_days)
    }

    /// Expired iff the window has started and `now` is past its end.
    #[must_use]
    pub fn is_expired_at(&self, now: UnixTime) -> bool {
        self.expires_at().is_some_and(|end| now > end)
    }

    /// No redemption since the last (re)issue.
    #[must_use]
    pub fn is_first_use(&self) -> bool {
        self.static_record.counter_state == self.counter || self.dynamic.first_use.is_none()
    }
}

fn word(bytes: &[u8], field: Field) -> [u8; PAGE_SIZE] {
    let mut out = [0u8; PAGE_SIZE];
    out.copy_from_slice(&bytes[field.offset()..field.offset() + PAGE_SIZE]);
    out
}
