//! Records bundled with their stored MAC tag.
//!
//! This module provides [`AuthenticatedRecord`], which pairs a decoded
//! record with the tag read next to it and tracks whether that tag has been
//! checked. Records read from a tag start unverified; records the protocol
//! builds itself are signed and therefore verified.

use crate::error::{TicketError, TicketErrorKind, TicketResult};
use crate::layout::{DynamicTicketRecord, StaticTicketRecord};
use crate::security::mac::MacEngine;
use crate::security::tag::MacTag;
use core::fmt;

/// A record whose exact MAC input is fixed by the tag layout.
pub trait MacProtected {
    /// Name used in error context and logs.
    const REGION: &'static str;

    /// The exact bytes covered by this record's MAC.
    fn mac_input(&self) -> Vec<u8>;
}

impl MacProtected for StaticTicketRecord {
    const REGION: &'static str = "static record";

    fn mac_input(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }
}

impl MacProtected for DynamicTicketRecord {
    const REGION: &'static str = "dynamic record";

    fn mac_input(&self) -> Vec<u8> {
        DynamicTicketRecord::mac_input(self).to_vec()
    }
}

/// A record bundled with its MAC tag.
///
/// `AuthenticatedRecord` is in one of two states:
///
/// - **Unverified**: decoded from a tag read, tag not yet checked
/// - **Verified**: tag matched, or the record was signed locally
///
/// # Example
///
/// ```
/// use tagticket::layout::{Label, StaticTicketRecord};
/// use tagticket::security::{AuthenticatedRecord, MacEngine, TagKey};
///
/// let engine = MacEngine::new(&TagKey::new([7; 16]))?;
/// let record = StaticTicketRecord {
///     app_tag: Label::from_text("BpAl").unwrap(),
///     version: Label::from_text("v1.0").unwrap(),
///     counter_state: 0,
///     ticket_count: 5,
///     valid_for_days: 30,
/// };
///
/// let signed = AuthenticatedRecord::sign(&engine, record);
/// let mut received = AuthenticatedRecord::from_parts(record, *signed.tag());
/// assert!(received.verify(&engine).is_ok());
/// # Ok::<(), tagticket::TicketError>(())
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedRecord<R> {
    record: R,
    tag: MacTag,
    verified: bool,
}

impl<R: MacProtected> AuthenticatedRecord<R> {
    /// Signs a record. The result is verified since we generated the tag.
    #[must_use]
    pub fn sign(engine: &MacEngine, record: R) -> Self {
        let tag = MacTag::compute(engine, &record.mac_input());
        Self {
            record,
            tag,
            verified: true,
        }
    }

    /// Wraps a record and tag read from a tag (unverified).
    #[must_use]
    pub const fn from_parts(record: R, tag: MacTag) -> Self {
        Self {
            record,
            tag,
            verified: false,
        }
    }

    /// Verifies the stored tag.
    ///
    /// # Errors
    ///
    /// `EmptyMac` if the stored tag is all zero, `InvalidMac` if it does not
    /// match. Both carry the region name as context.
    pub fn verify(&mut self, engine: &MacEngine) -> TicketResult<&R> {
        if self.tag.is_empty() {
            return Err(TicketError::new(TicketErrorKind::EmptyMac).with_context(R::REGION));
        }
        if !self.tag.verify(engine, &self.record.mac_input()) {
            return Err(TicketError::new(TicketErrorKind::InvalidMac).with_context(R::REGION));
        }
        self.verified = true;
        Ok(&self.record)
    }

    /// Returns `true` if the tag has been verified.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.verified
    }

    /// Returns the record.
    ///
    /// # Security Warning
    ///
    /// Check [`is_verified`](Self::is_verified) before trusting the data.
    #[must_use]
    pub const fn record(&self) -> &R {
        &self.record
    }

    /// Returns the stored tag.
    #[must_use]
    pub const fn tag(&self) -> &MacTag {
        &self.tag
    }

    /// Consumes the wrapper and returns its parts.
    #[must_use]
    pub fn into_parts(self) -> (R, MacTag) {
        (self.record, self.tag)
    }

    /// Returns the record if verified, `Err(self)` otherwise.
    pub fn try_into_verified(self) -> Result<R, Self> {
        if self.verified {
            Ok(self.record)
        } else {
            Err(self)
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for AuthenticatedRecord<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedRecord")
            .field("record", &self.record)
            .field("tag", &self.tag)
            .field("verified", &self.verified)
            .finish()
    }
}
