//! Ticket operations.
//!
//! Each operation is one tap. It opens a [`Session`](crate::session::Session)
//! through the shared [`TicketContext`], reads the whole ticket region once,
//! decides, and writes back only the pages that change.
//!
//! | Operation | Entry point | Writes |
//! |---|---|---|
//! | issue / top-up / reissue | [`TicketIssuer::issue`] | static pages, then dynamic pages |
//! | redeem one use | [`TicketValidator::use_ticket`] | dynamic pages (first use), counter, best-effort trailer |
//! | format | [`admin::format_card`] | every ticket data page |
//! | protect | [`admin::protect_memory`] | AUTH0/AUTH1 |
//!
//! Every operation returns a [`TicketResult`](crate::TicketResult);
//! [`StatusReport`] renders any of them as a message plus success flag.

pub mod admin;
pub mod context;
pub mod issuer;
pub mod outcome;
pub mod validator;

pub use admin::{format_card, protect_memory};
pub use context::{TicketContext, TicketStats};
pub use issuer::TicketIssuer;
pub use outcome::{AdminOutcome, IssueOutcome, StatusReport, Validated};
pub use validator::TicketValidator;
