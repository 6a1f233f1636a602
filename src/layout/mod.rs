//! Tag memory layout.
//!
//! Maps the tag's fixed 4-byte pages to the named fields of the ticket.
//! The whole ticket region, plus the lock page and the hardware counter,
//! is captured by a single 16-page read starting at [`TICKET_START_PAGE`]:
//!
//! ```text
//!  page  offset  field
//!  ────  ──────  ───────────────────────────────────────────────
//!   26      0    appTag        ┐
//!   27      4    version       │
//!   28      8    counterState  │ static record (MAC input: [0, 20))
//!   29     12    ticketCount   │
//!   30     16    validForDays  ┘
//!   31     20    staticMac
//!   32     24    firstUse      ┐ dynamic record (MAC input: firstUse)
//!   33     28    lastUse       ┘
//!   34     32    dynamicMac
//!   35–39  36    usageLog (5 × timestamp)
//!   40     56    lock bytes
//!   41     60    tag counter (16-bit little-endian, hardware maintained)
//! ```
//!
//! Pages 0–1 hold the UID; pages 42–43 hold AUTH0/AUTH1 and 44–47 the
//! write-only authentication key.

pub mod image;
pub mod record;

pub use image::{RecordClass, TicketImage};
pub use record::{DynamicTicketRecord, InvalidLabel, Label, StaticTicketRecord, UsageLog};

use core::ops::Range;

/// Bytes per tag page.
pub const PAGE_SIZE: usize = 4;

/// Total addressable pages on the tag.
pub const PAGE_COUNT: u8 = 48;

/// First page of the UID.
pub const UID_PAGE: u8 = 0;

/// Pages read as the tag identity.
pub const UID_PAGE_COUNT: u8 = 2;

/// First page of the ticket region.
pub const TICKET_START_PAGE: u8 = 26;

/// Pages in one ticket region read (data, lock page, counter page).
pub const REGION_PAGE_COUNT: u8 = 16;

/// Bytes in one ticket region read.
pub const REGION_SIZE: usize = REGION_PAGE_COUNT as usize * PAGE_SIZE;

/// Pages holding ticket data proper (everything the protocol ever writes
/// except the counter).
pub const TICKET_DATA_PAGE_COUNT: u8 = 14;

/// Lock bytes page.
pub const LOCK_PAGE: u8 = 40;

/// Hardware one-way counter page.
pub const COUNTER_PAGE: u8 = 41;

/// AUTH0: first page that requires authentication.
pub const AUTH0_PAGE: u8 = 42;

/// AUTH1: bit 0 clear means reads are protected too.
pub const AUTH1_PAGE: u8 = 43;

/// First of the four write-only key pages.
pub const KEY_PAGE: u8 = 44;

/// Pages holding the authentication key.
pub const KEY_PAGE_COUNT: u8 = 4;

/// Entries in the circular usage log.
pub const USAGE_LOG_LEN: usize = 5;

/// Payload that advances the hardware counter by exactly one.
pub const COUNTER_INCREMENT: [u8; PAGE_SIZE] = [1, 0, 0, 0];

/// A named field of the ticket region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Application tag.
    AppTag,
    /// Format version.
    Version,
    /// Counter snapshot taken at (re)issue.
    CounterState,
    /// Uses granted since `CounterState` was captured.
    TicketCount,
    /// Validity window in days, counted from first use.
    ValidForDays,
    /// Truncated MAC over the static record.
    StaticMac,
    /// Timestamp of the first redemption.
    FirstUse,
    /// Timestamp of the latest redemption.
    LastUse,
    /// Truncated MAC over `FirstUse`.
    DynamicMac,
    /// Circular log of recent redemption timestamps.
    UsageLog,
    /// Lock bytes.
    Lock,
    /// Hardware counter.
    TagCounter,
}

impl Field {
    /// Every field in region order.
    pub const ALL: [Self; 12] = [
        Self::AppTag,
        Self::Version,
        Self::CounterState,
        Self::TicketCount,
        Self::ValidForDays,
        Self::StaticMac,
        Self::FirstUse,
        Self::LastUse,
        Self::DynamicMac,
        Self::UsageLog,
        Self::Lock,
        Self::TagCounter,
    ];

    /// Byte offset from the start of the ticket region.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::AppTag => 0,
            Self::Version => 4,
            Self::CounterState => 8,
            Self::TicketCount => 12,
            Self::ValidForDays => 16,
            Self::StaticMac => 20,
            Self::FirstUse => 24,
            Self::LastUse => 28,
            Self::DynamicMac => 32,
            Self::UsageLog => 36,
            Self::Lock => 56,
            Self::TagCounter => 60,
        }
    }

    /// Field size in bytes.
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::UsageLog => USAGE_LOG_LEN * PAGE_SIZE,
            _ => PAGE_SIZE,
        }
    }

    /// Byte range within the region read.
    #[must_use]
    pub const fn range(self) -> Range<usize> {
        self.offset()..self.offset() + self.len()
    }

    /// Tag page holding the start of the field.
    #[must_use]
    pub const fn page(self) -> u8 {
        TICKET_START_PAGE + (self.offset() / PAGE_SIZE) as u8
    }

    /// Number of pages the field spans.
    #[must_use]
    pub const fn page_count(self) -> u8 {
        (self.len() / PAGE_SIZE) as u8
    }
}

/// Bytes covered by the static MAC: appTag through validForDays.
pub const STATIC_MAC_INPUT: Range<usize> = Field::AppTag.offset()..Field::StaticMac.offset();

// Layout sanity: fields tile the region exactly and land where the hardware
// puts the lock and counter pages.
const _: () = assert!(Field::TagCounter.offset() + Field::TagCounter.len() == REGION_SIZE);
const _: () = assert!(Field::Lock.page() == LOCK_PAGE);
const _: () = assert!(Field::TagCounter.page() == COUNTER_PAGE);
const _: () = assert!(
    Field::UsageLog.page() + Field::UsageLog.page_count() == TICKET_START_PAGE + TICKET_DATA_PAGE_COUNT
);
