//! Administrative operations, invoked explicitly and never from `use`.

use super::context::TicketContext;
use super::outcome::AdminOutcome;
use crate::config::TicketConfig;
use crate::error::{TicketError, TicketResult};
use crate::layout::{AUTH0_PAGE, PAGE_SIZE, TICKET_DATA_PAGE_COUNT, TICKET_START_PAGE};
use crate::session::Session;
use crate::tracing_compat::{debug, info};
use crate::transport::TagTransport;

/// AUTH1 bit that, when clear, extends protection to reads.
const AUTH1_READ_OPEN: u8 = 0x01;

/// Zeroes every ticket data page, leaving a blank tag.
///
/// Keys, protection and the hardware counter are untouched.
pub fn format_card<T>(ctx: &TicketContext, transport: &mut T) -> TicketResult<AdminOutcome>
where
    T: TagTransport + ?Sized,
{
    let result = ctx.open_session(transport).and_then(|mut session| {
        let zeros = [0u8; TICKET_DATA_PAGE_COUNT as usize * PAGE_SIZE];
        session.write(&zeros, TICKET_START_PAGE, "ticket region")?;
        info!(uid = %session.uid(), "card formatted");
        Ok(AdminOutcome::Formatted)
    });
    if let Err(err) = &result {
        ctx.note_rejection("format", err);
    }
    result
}

/// Protects reads and writes from the configured AUTH0 page onwards.
pub fn protect_memory<T>(ctx: &TicketContext, transport: &mut T) -> TicketResult<AdminOutcome>
where
    T: TagTransport + ?Sized,
{
    let result = ctx
        .open_session(transport)
        .and_then(|mut session| ensure_protected(&mut session, ctx.config()));
    if let Err(err) = &result {
        ctx.note_rejection("protect", err);
    }
    result
}

/// Writes AUTH0/AUTH1 unless they already hold the target values.
pub(crate) fn ensure_protected<T>(
    session: &mut Session<'_, T>,
    config: &TicketConfig,
) -> TicketResult<AdminOutcome>
where
    T: TagTransport + ?Sized,
{
    let current = session.read_pages(AUTH0_PAGE, 2, "auth configuration")?;
    let mut pages = <[u8; 2 * PAGE_SIZE]>::try_from(current.as_slice()).map_err(|_| {
        TicketError::read_failure()
            .with_context(format!("auth configuration: got {} bytes", current.len()))
    })?;

    let auth1 = PAGE_SIZE;
    if pages[0] == config.auth0_page && pages[auth1] & AUTH1_READ_OPEN == 0 {
        return Ok(AdminOutcome::AlreadyProtected);
    }

    pages[0] = config.auth0_page;
    pages[auth1] &= !AUTH1_READ_OPEN;
    session.write(&pages, AUTH0_PAGE, "auth configuration")?;
    debug!(uid = %session.uid(), auth0 = config.auth0_page, "memory protection enabled");
    Ok(AdminOutcome::Protected)
}
