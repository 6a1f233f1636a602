//! Ticket redemption.
//!
//! ```text
//! READ_UID → AUTHENTICATE → REKEY → READ_RECORD → CHECK_APPTAG → CHECK_VERSION
//!   → CHECK_MACS → CHECK_REMAINING → CHECK_EXPIRY
//!   → (FIRST_USE | SUBSEQUENT_USE) → INCREMENT → TRAILER
//! ```
//!
//! The counter increment is the only write that consumes a use, and it is
//! always the last mandatory write: a session torn before it leaves the
//! ticket exactly as valuable as before.

use super::context::TicketContext;
use super::issuer::verify_image;
use super::outcome::Validated;
use crate::error::{TicketError, TicketErrorKind, TicketResult};
use crate::layout::{DynamicTicketRecord, Field, RecordClass, TicketImage};
use crate::session::Session;
use crate::tracing_compat::{debug, info};
use crate::transport::TagTransport;
use crate::types::UnixTime;
use std::sync::atomic::Ordering;

/// Redeems one use per call.
#[derive(Debug, Clone, Copy)]
pub struct TicketValidator<'a> {
    ctx: &'a TicketContext,
}

impl<'a> TicketValidator<'a> {
    /// Creates a validator over a shared context.
    #[must_use]
    pub const fn new(ctx: &'a TicketContext) -> Self {
        Self { ctx }
    }

    /// Redeems one use.
    ///
    /// Never creates a record: blank and foreign tags are rejected.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailure`, `ReadFailure`, `WriteFailure`
    /// - `InvalidAppTag` for a blank or foreign tag, `InvalidVersion`
    /// - `EmptyMac` / `InvalidMac` when either record fails verification
    /// - `NoRemainingUses`, `Expired`, `CooldownActive`
    #[cfg_attr(not(feature = "tracing-integration"), allow(unused_variables))]
    pub fn use_ticket<T>(&self, transport: &mut T) -> TicketResult<Validated>
    where
        T: TagTransport + ?Sized,
    {
        let result = self.try_use(transport);
        match &result {
            Ok(validated) => {
                self.ctx.stats().validated.fetch_add(1, Ordering::Relaxed);
                info!(
                    remaining = validated.remaining,
                    first_use = validated.first_use,
                    expires_at = %validated.expires_at,
                    "ticket validated"
                );
            }
            Err(err) => self.ctx.note_rejection("use", err),
        }
        result
    }

    fn try_use<T>(&self, transport: &mut T) -> TicketResult<Validated>
    where
        T: TagTransport + ?Sized,
    {
        let config = self.ctx.config();
        let now = self.ctx.now();
        let mut session = self.ctx.open_session(transport)?;
        let mut image = session.read_image()?;

        match image.classify(config) {
            RecordClass::Blank => {
                return Err(
                    TicketError::new(TicketErrorKind::InvalidAppTag).with_context("blank tag")
                );
            }
            RecordClass::Foreign => {
                return Err(TicketError::new(TicketErrorKind::InvalidAppTag)
                    .with_context(format!("found {}", image.static_record.app_tag)));
            }
            RecordClass::VersionMismatch => {
                return Err(TicketError::new(TicketErrorKind::InvalidVersion)
                    .with_context(format!("found {}", image.static_record.version)));
            }
            RecordClass::Ours => {}
        }

        verify_image(&session, &image)?;

        let remaining = image.remaining_uses();
        if remaining == 0 {
            return Err(TicketError::new(TicketErrorKind::NoRemainingUses));
        }
        if image.is_expired_at(now) {
            let expired_at = image.expires_at().unwrap_or(now);
            return Err(TicketError::new(TicketErrorKind::Expired)
                .with_context(format!("expired on {}", expired_at.display_utc())));
        }

        let first_use = image.is_first_use();
        if first_use {
            start_window(&mut session, &mut image, now)?;
        } else {
            check_cooldown(&image, now, config.cooldown_secs)?;
        }
        session.increment_counter()?;

        let bookkeeping_written = write_trailer(&mut session, &mut image, now, first_use);
        debug!(uid = %session.uid(), first_use, bookkeeping_written, "use recorded");

        Ok(Validated {
            remaining: remaining - 1,
            expires_at: image
                .expires_at()
                .unwrap_or_else(|| now.add_days(image.static_record.valid_for_days)),
            first_use,
            bookkeeping_written,
        })
    }
}

/// Stamps first and last use and re-signs the dynamic record.
fn start_window<T>(
    session: &mut Session<'_, T>,
    image: &mut TicketImage,
    now: UnixTime,
) -> TicketResult<()>
where
    T: TagTransport + ?Sized,
{
    let dynamic = DynamicTicketRecord {
        first_use: Some(now),
        last_use: Some(now),
    };
    image.set_dynamic(session.mac(), dynamic);
    session.write(&image.dynamic_pages(), Field::FirstUse.page(), "dynamic record")
}

/// A clock that went backwards never blocks a use.
fn check_cooldown(image: &TicketImage, now: UnixTime, cooldown_secs: u32) -> TicketResult<()> {
    let Some(last) = image.dynamic.last_use else {
        return Ok(());
    };
    if last <= now && now.secs_since(last) < cooldown_secs {
        return Err(TicketError::new(TicketErrorKind::CooldownActive)
            .with_context(format!("last use {}s ago", now.secs_since(last))));
    }
    Ok(())
}

/// Last-use stamp and usage log slot. Returns whether every write landed.
fn write_trailer<T>(
    session: &mut Session<'_, T>,
    image: &mut TicketImage,
    now: UnixTime,
    first_use: bool,
) -> bool
where
    T: TagTransport + ?Sized,
{
    let mut complete = true;
    if !first_use {
        image.dynamic.last_use = Some(now);
        complete &= session.write_best_effort(
            &UnixTime::encode(Some(now)),
            Field::LastUse.page(),
            "last use",
        );
    }

    let slot = image.usage_log.record(now);
    let page = Field::UsageLog.page() + slot as u8;
    complete &= session.write_best_effort(&image.usage_log.slot_bytes(slot), page, "usage log");
    complete
}
