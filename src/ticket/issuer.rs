//! Issue, top-up and reissue.

use super::admin;
use super::context::TicketContext;
use super::outcome::IssueOutcome;
use crate::error::{TicketError, TicketErrorKind, TicketResult};
use crate::layout::{
    DynamicTicketRecord, Field, RecordClass, StaticTicketRecord, TicketImage, UsageLog,
};
use crate::session::Session;
use crate::tracing_compat::{debug, info, warn};
use crate::transport::TagTransport;
use crate::types::UnixTime;
use std::sync::atomic::Ordering;

/// Writes ticket grants onto tags.
///
/// Each call is one tap: the issuer opens its own session, decides between
/// a top-up of the live ticket and a fresh issue, and writes only the pages
/// that change.
#[derive(Debug, Clone, Copy)]
pub struct TicketIssuer<'a> {
    ctx: &'a TicketContext,
}

impl<'a> TicketIssuer<'a> {
    /// Creates an issuer over a shared context.
    #[must_use]
    pub const fn new(ctx: &'a TicketContext) -> Self {
        Self { ctx }
    }

    /// Grants `uses` rides valid for `days` days from first use.
    ///
    /// A live ticket (unused, or with uses left and not expired) is topped
    /// up; a blank or dead one is replaced.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for zero `uses` or zero `days`, before any I/O
    /// - `AuthenticationFailure`, `ReadFailure`, `WriteFailure`
    /// - `InvalidAppTag` / `InvalidVersion` for another application's data
    /// - `EmptyMac` / `InvalidMac` when an existing record fails verification
    /// - `UnsafeTicketLimitExceeded` when the result would exceed
    ///   `max_remaining_tickets`
    pub fn issue<T>(&self, transport: &mut T, days: u32, uses: u32) -> TicketResult<IssueOutcome>
    where
        T: TagTransport + ?Sized,
    {
        let result = self.try_issue(transport, days, uses);
        match &result {
            Ok(outcome) => {
                let counter = match outcome {
                    IssueOutcome::Issued { .. } => &self.ctx.stats().issued,
                    IssueOutcome::ToppedUp { .. } => &self.ctx.stats().topped_up,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                info!(
                    remaining = outcome.remaining(),
                    valid_for_days = outcome.valid_for_days(),
                    "{outcome}"
                );
            }
            Err(err) => self.ctx.note_rejection("issue", err),
        }
        result
    }

    #[cfg_attr(not(feature = "tracing-integration"), allow(unused_variables))]
    fn try_issue<T>(&self, transport: &mut T, days: u32, uses: u32) -> TicketResult<IssueOutcome>
    where
        T: TagTransport + ?Sized,
    {
        if uses == 0 || days == 0 {
            return Err(TicketError::new(TicketErrorKind::InvalidRequest)
                .with_context(format!("uses={uses}, days={days}")));
        }

        let config = self.ctx.config();
        let now = self.ctx.now();
        let mut session = self.ctx.open_session(transport)?;

        let mut image = session.read_image()?;
        match image.classify(config) {
            RecordClass::Blank => {
                debug!(uid = %session.uid(), "blank tag");
                return self.fresh_issue(&mut session, image, days, uses);
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

        if is_live(&image, now) {
            self.top_up(&mut session, &mut image, days, uses)
        } else {
            debug!(uid = %session.uid(), "prior grant spent or expired; reissuing");
            self.fresh_issue(&mut session, image, days, uses)
        }
    }

    /// Best-effort AUTH0/AUTH1 setup, run only once the tag is known to be
    /// blank or ours and the grant has passed its limit checks.
    #[cfg_attr(not(feature = "tracing-integration"), allow(unused_variables))]
    fn protect<T>(&self, session: &mut Session<'_, T>)
    where
        T: TagTransport + ?Sized,
    {
        if let Err(err) = admin::ensure_protected(session, self.ctx.config()) {
            warn!(uid = %session.uid(), error = %err, "memory protection not applied");
        }
    }

    fn top_up<T>(
        &self,
        session: &mut Session<'_, T>,
        image: &mut TicketImage,
        days: u32,
        uses: u32,
    ) -> TicketResult<IssueOutcome>
    where
        T: TagTransport + ?Sized,
    {
        let config = self.ctx.config();
        let previous_remaining = image.remaining_uses();
        let remaining = previous_remaining
            .checked_add(uses)
            .filter(|&total| total <= config.max_remaining_tickets)
            .ok_or_else(|| unsafe_limit(previous_remaining, uses, config.max_remaining_tickets))?;

        let mut record = image.static_record;
        record.ticket_count = record
            .ticket_count
            .checked_add(uses)
            .ok_or_else(|| unsafe_limit(previous_remaining, uses, config.max_remaining_tickets))?;
        let extended = record
            .valid_for_days
            .saturating_add(days)
            .min(config.max_valid_days);
        record.valid_for_days = record.valid_for_days.max(extended);
        image.set_static(session.mac(), record);

        // A started grant restarts its validity window. The static tail and
        // the cleared dynamic record share one write.
        let end = if image.dynamic.first_use.is_some() {
            image.set_dynamic(session.mac(), DynamicTicketRecord::CLEARED);
            Field::UsageLog.offset()
        } else {
            Field::FirstUse.offset()
        };

        self.protect(session);
        let region = image.to_region();
        session.write(
            &region[Field::TicketCount.offset()..end],
            Field::TicketCount.page(),
            "static and dynamic records",
        )?;

        Ok(IssueOutcome::ToppedUp {
            added: uses,
            previous_remaining,
            remaining,
            valid_for_days: record.valid_for_days,
        })
    }

    fn fresh_issue<T>(
        &self,
        session: &mut Session<'_, T>,
        mut image: TicketImage,
        days: u32,
        uses: u32,
    ) -> TicketResult<IssueOutcome>
    where
        T: TagTransport + ?Sized,
    {
        let config = self.ctx.config();
        if uses > config.max_remaining_tickets {
            return Err(unsafe_limit(0, uses, config.max_remaining_tickets));
        }

        let record = StaticTicketRecord {
            app_tag: config.app_tag,
            version: config.version,
            counter_state: image.counter,
            ticket_count: uses,
            valid_for_days: days.min(config.max_valid_days),
        };
        image.set_static(session.mac(), record);
        image.set_dynamic(session.mac(), DynamicTicketRecord::CLEARED);
        image.usage_log = UsageLog::default();

        self.protect(session);
        let region = image.to_region();
        session.write(
            &region[..Field::Lock.offset()],
            Field::AppTag.page(),
            "ticket records",
        )?;

        Ok(IssueOutcome::Issued {
            uses,
            valid_for_days: record.valid_for_days,
        })
    }
}

/// Checks the static MAC, and the dynamic MAC once the window has started.
pub(crate) fn verify_image<T>(session: &Session<'_, T>, image: &TicketImage) -> TicketResult<()>
where
    T: TagTransport + ?Sized,
{
    image.static_authenticated().verify(session.mac())?;
    if image.dynamic.first_use.is_some() {
        image.dynamic_authenticated().verify(session.mac())?;
    }
    Ok(())
}

/// Unused, or uses left inside an unexpired window.
fn is_live(image: &TicketImage, now: UnixTime) -> bool {
    image.dynamic.first_use.is_none() || (image.remaining_uses() > 0 && !image.is_expired_at(now))
}

fn unsafe_limit(remaining: u32, uses: u32, max: u32) -> TicketError {
    TicketError::new(TicketErrorKind::UnsafeTicketLimitExceeded)
        .with_context(format!("{remaining} remaining + {uses} requested > {max}"))
}
