//! Core types shared by every layer of the ticket protocol.
//!
//! - [`id`]: the tag identity and on-tag timestamps
//! - [`clock`]: the time source the protocol consults instead of the wall clock

pub mod clock;
pub mod id;

pub use clock::{Clock, SystemClock};
pub use id::{SECS_PER_DAY, TagUid, UID_SIZE, UnixTime};
