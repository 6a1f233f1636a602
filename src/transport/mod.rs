//! The tag transport seam.
//!
//! The protocol speaks to a tag through three primitives: authenticate with
//! a key, read a contiguous page range, write a contiguous page range. Each
//! is one blocking radio round-trip that can fail on its own; removing the
//! tag mid-session surfaces as a failure of whichever call is in flight.
//!
//! Real readers implement [`TagTransport`] outside this crate; tests use
//! [`SimulatedTag`](crate::lab::SimulatedTag).

use crate::error::TicketError;
use crate::layout::{PAGE_COUNT, PAGE_SIZE};
use crate::security::TagKey;
use thiserror::Error;

/// Failure of a single transport primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The tag left the field.
    #[error("tag removed from the field")]
    Removed,
    /// The tag refused the command for a page.
    #[error("tag refused access to page {page}")]
    Nak {
        /// Page the command addressed.
        page: u8,
    },
    /// The page range does not exist on the tag.
    #[error("pages {start}..{start}+{count} are out of range")]
    OutOfRange {
        /// First page requested.
        start: u8,
        /// Number of pages requested.
        count: u8,
    },
    /// The payload does not match the page count.
    #[error("expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Bytes the page count implies.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// The tag rejected the key.
    #[error("authentication rejected")]
    AuthRejected,
}

impl TransportError {
    /// Maps a failed read to the protocol taxonomy.
    #[must_use]
    pub fn into_read_failure(self, what: &str) -> TicketError {
        TicketError::read_failure().with_context(format!("{what}: {self}"))
    }

    /// Maps a failed write to the protocol taxonomy.
    #[must_use]
    pub fn into_write_failure(self, what: &str) -> TicketError {
        TicketError::write_failure().with_context(format!("{what}: {self}"))
    }
}

/// Exclusive access to one tag for the length of a session.
pub trait TagTransport {
    /// Authenticates with `key`. Later reads and writes of protected pages
    /// succeed only after an accepted key.
    fn authenticate(&mut self, key: &TagKey) -> Result<(), TransportError>;

    /// Reads `count` pages starting at `start`; returns `count * 4` bytes.
    fn read_pages(&mut self, start: u8, count: u8) -> Result<Vec<u8>, TransportError>;

    /// Writes `count` pages starting at `start` from `data`.
    fn write_pages(&mut self, data: &[u8], start: u8, count: u8) -> Result<(), TransportError>;
}

impl<T: TagTransport + ?Sized> TagTransport for &mut T {
    fn authenticate(&mut self, key: &TagKey) -> Result<(), TransportError> {
        (**self).authenticate(key)
    }

    fn read_pages(&mut self, start: u8, count: u8) -> Result<Vec<u8>, TransportError> {
        (**self).read_pages(start, count)
    }

    fn write_pages(&mut self, data: &[u8], start: u8, count: u8) -> Result<(), TransportError> {
        (**self).write_pages(data, start, count)
    }
}

/// Checks a page range and payload before it goes on the air.
pub fn check_range(start: u8, count: u8, len: Option<usize>) -> Result<(), TransportError> {
    if count == 0 || u16::from(start) + u16::from(count) > u16::from(PAGE_COUNT) {
        return Err(TransportError::OutOfRange { start, count });
    }
    if let Some(actual) = len {
        let expected = usize::from(count) * PAGE_SIZE;
        if actual != expected {
            return Err(TransportError::LengthMismatch { expected, actual });
        }
    }
    Ok(())
}
