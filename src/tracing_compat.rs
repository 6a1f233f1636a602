//! Optional tracing integration.
//!
//! With the `tracing-integration` feature, this module re-exports the
//! `tracing` event macros. Without it, the same macro names expand to
//! nothing, so call sites never need their own `#[cfg]`.
//!
//! ```ignore
//! use crate::tracing_compat::{debug, warn};
//!
//! debug!(uid = %uid, "session opened");
//! warn!(kind = ?err.kind(), "ticket rejected");
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    // Suffixed names: a bare `use warn;` would be ambiguous with the built-in
    // `#[warn]` attribute.
    macro_rules! trace_noop {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! debug_noop {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! info_noop {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! warn_noop {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! error_noop {
        ($($arg:tt)*) => {{}};
    }

    pub(crate) use {debug_noop, error_noop, info_noop, trace_noop, warn_noop};
}

#[cfg(not(feature = "tracing-integration"))]
#[allow(unused_imports)]
pub(crate) use self::noop::{
    debug_noop as debug, error_noop as error, info_noop as info, trace_noop as trace,
    warn_noop as warn,
};
