//! Deterministic lab harness for protocol testing.
//!
//! The lab provides:
//!
//! - An in-memory tag with the real page map, access rules and one-way
//!   counter ([`SimulatedTag`])
//! - Per-call fault injection: failed writes, failed reads, removal from
//!   the field between two writes
//! - Virtual time ([`VirtualClock`]); no wall-clock dependencies
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tagticket::lab::{SimulatedTag, VirtualClock};
//! use tagticket::security::KeyRing;
//! use tagticket::ticket::{TicketContext, TicketIssuer, TicketValidator};
//! use tagticket::types::UnixTime;
//! use tagticket::TicketConfig;
//!
//! let clock = Arc::new(VirtualClock::new(UnixTime::from_secs(1_700_000_000)));
//! let ctx = TicketContext::new(KeyRing::for_testing(1), TicketConfig::default(), clock);
//! let mut tag = SimulatedTag::with_seed(42);
//!
//! TicketIssuer::new(&ctx).issue(&mut tag, 30, 5)?;
//! let validated = TicketValidator::new(&ctx).use_ticket(&mut tag)?;
//! assert_eq!(validated.remaining, 4);
//! # Ok::<(), tagticket::TicketError>(())
//! ```

pub mod clock;
pub mod tag;

pub use clock::VirtualClock;
pub use tag::{COUNTER_MAX, PageWrite, SimulatedTag};
