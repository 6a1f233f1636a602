//! Key management and ticket integrity.
//!
//! Every byte the protocol trusts on a tag is covered by a truncated
//! HMAC-SHA256 keyed with a per-tag key. Master secrets never touch tag data
//! directly: they are diversified with the tag UID first.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        KeyRing                           │
//! │  • MAC master ──► KeyDiversifier ──► per-tag MAC key     │
//! │  • auth master ─► KeyDiversifier ──► per-tag auth key    │
//! │  • factory default key (unclaimed tags)                  │
//! └──────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                       MacEngine                          │
//! │  • HMAC-SHA256, re-keyed once per session                │
//! │  • MacTag: first 4 bytes, zero = absent                  │
//! └──────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  AuthenticatedRecord                     │
//! │  • record + stored tag bundle                            │
//! │  • verified when signed, unverified when read            │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod authenticated;
pub mod context;
pub mod diversify;
pub mod key;
pub mod mac;
pub mod tag;

pub use authenticated::{AuthenticatedRecord, MacProtected};
pub use context::KeyRing;
pub use diversify::KeyDiversifier;
pub use key::{FACTORY_DEFAULT_KEY, MasterKey, TAG_KEY_SIZE, TagKey};
pub use mac::{MAC_OUTPUT_SIZE, MacEngine};
pub use tag::{MacTag, TAG_SIZE};
