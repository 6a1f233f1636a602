//! Tagticket: offline ride tickets on counter-equipped NFC tags.
//!
//! # Overview
//!
//! A ticket lives entirely on the tag. There is no server and no database to
//! consult at the gate; correctness comes from three things the tag itself
//! provides: authenticated writes, a one-way hardware counter, and a few
//! pages of storage that this crate protects with a MAC.
//!
//! # Core Guarantees
//!
//! - **Counter-backed uses**: remaining uses are derived from the hardware
//!   counter, which only an authenticated session can advance
//! - **Tamper evidence**: every record the protocol relies on is MAC'd with a
//!   per-tag diversified key; an empty or wrong MAC is fatal, never repaired
//! - **Torn-write safety**: write order guarantees that any prefix of an
//!   operation's writes is either re-processable or worth nothing
//! - **Explicit session state**: keys, policy and time travel in a
//!   [`TicketContext`](ticket::TicketContext); nothing is global
//! - **Deterministic testing**: [`lab`] provides a simulated tag with fault
//!   injection and a virtual clock
//!
//! # Module Structure
//!
//! - [`types`]: Tag identity, timestamps, clock abstraction
//! - [`layout`]: Page map and typed ticket records
//! - [`security`]: Key diversification, MAC engine, authenticated records
//! - [`transport`]: The tag I/O seam
//! - [`session`]: Authentication, tag claiming, per-tap sessions
//! - [`ticket`]: Issue, top-up, validation and administrative operations
//! - [`config`]: Ticket policy
//! - [`error`](mod@error): Error taxonomy
//! - [`lab`]: Simulated tag and virtual clock for testing
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tagticket::lab::{SimulatedTag, VirtualClock};
//! use tagticket::security::KeyRing;
//! use tagticket::ticket::{StatusReport, TicketContext, TicketIssuer, TicketValidator};
//! use tagticket::types::UnixTime;
//! use tagticket::TicketConfig;
//!
//! let clock = Arc::new(VirtualClock::new(UnixTime::from_secs(1_700_000_000)));
//! let ctx = TicketContext::new(KeyRing::for_testing(7), TicketConfig::default(), clock);
//! let mut tag = SimulatedTag::with_seed(1);
//!
//! let issued = TicketIssuer::new(&ctx).issue(&mut tag, 30, 5);
//! assert_eq!(StatusReport::from_result(&issued).message, "5 new tickets issued.");
//!
//! let used = TicketValidator::new(&ctx).use_ticket(&mut tag);
//! let report = StatusReport::from_result(&used);
//! assert!(report.success);
//! assert!(report.message.starts_with("Ticket validated (1st use).\n4 tickets remaining."));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod config;
pub mod error;
pub mod lab;
pub mod layout;
pub mod security;
pub mod session;
pub mod ticket;
pub mod tracing_compat;
pub mod transport;
pub mod types;

// Re-exports for convenient access to core types
pub use config::{ConfigError, TicketConfig};
pub use error::{TicketError, TicketErrorKind, TicketResult};
pub use security::{KeyRing, MasterKey, TagKey};
pub use session::{AuthenticationManager, ClaimState, Session};
pub use ticket::{
    AdminOutcome, IssueOutcome, StatusReport, TicketContext, TicketIssuer, TicketValidator,
    Validated,
};
pub use transport::{TagTransport, TransportError};
pub use types::{Clock, SystemClock, TagUid, UnixTime};
