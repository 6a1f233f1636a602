//! Ticket protocol error types.
//!
//! Every failure the protocol can report is a [`TicketError`]: a
//! [`TicketErrorKind`] from the fixed taxonomy plus optional free-form
//! context. Nothing below the component boundary panics or leaks a raw
//! transport error; callers match on the kind and show the message.

use core::fmt;

/// The kind of ticket protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketErrorKind {
    /// Neither the operational nor the factory key authenticated, or key
    /// rotation on an unclaimed tag did not take.
    AuthenticationFailure,
    /// A page read failed or returned a malformed payload.
    ReadFailure,
    /// A page write failed. Earlier writes of the same operation may have landed.
    WriteFailure,
    /// The tag carries another application's data.
    InvalidAppTag,
    /// The tag carries our application tag with an unsupported format version.
    InvalidVersion,
    /// A MAC field that must be present is all zero.
    EmptyMac,
    /// A MAC field does not match the record it protects.
    InvalidMac,
    /// The ticket has no uses left.
    NoRemainingUses,
    /// The validity window that started at first use has elapsed.
    Expired,
    /// The previous accepted use is too recent; treated as a double tap.
    CooldownActive,
    /// The request would push the remaining uses above the safety ceiling.
    UnsafeTicketLimitExceeded,
    /// The caller asked for something meaningless (zero uses, zero days).
    InvalidRequest,
}

impl TicketErrorKind {
    /// Returns `true` for integrity failures, which are never retried and
    /// never followed by a write.
    #[must_use]
    pub const fn is_integrity_failure(self) -> bool {
        matches!(self, Self::EmptyMac | Self::InvalidMac)
    }

    /// Returns `true` for I/O failures, where retrying the whole session is
    /// reasonable.
    #[must_use]
    pub const fn is_io_failure(self) -> bool {
        matches!(self, Self::ReadFailure | Self::WriteFailure)
    }

    /// Short human-readable description of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticationFailure => "authentication failed",
            Self::ReadFailure => "failed to read the tag",
            Self::WriteFailure => "failed to write the tag",
            Self::InvalidAppTag => "invalid app tag",
            Self::InvalidVersion => "unsupported ticket format version",
            Self::EmptyMac => "empty MAC",
            Self::InvalidMac => "invalid MAC",
            Self::NoRemainingUses => "no tickets remaining",
            Self::Expired => "tickets expired",
            Self::CooldownActive => "ticket was validated moments ago",
            Self::UnsafeTicketLimitExceeded => "ticket limit exceeded",
            Self::InvalidRequest => "invalid request",
        }
    }
}

impl fmt::Display for TicketErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a ticket operation.
///
/// # Example
///
/// ```
/// use tagticket::{TicketError, TicketErrorKind};
///
/// let err = TicketError::new(TicketErrorKind::InvalidMac).with_context("static record");
///
/// assert!(err.is_integrity_failure());
/// assert!(err.to_string().contains("static record"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketError {
    kind: TicketErrorKind,
    context: Option<String>,
}

impl TicketError {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: TicketErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Creates an authentication failure.
    #[must_use]
    pub const fn authentication_failure() -> Self {
        Self::new(TicketErrorKind::AuthenticationFailure)
    }

    /// Creates a read failure.
    #[must_use]
    pub const fn read_failure() -> Self {
        Self::new(TicketErrorKind::ReadFailure)
    }

    /// Creates a write failure.
    #[must_use]
    pub const fn write_failure() -> Self {
        Self::new(TicketErrorKind::WriteFailure)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> TicketErrorKind {
        self.kind
    }

    /// Returns `true` if this is an `EmptyMac` or `InvalidMac` failure.
    #[must_use]
    pub const fn is_integrity_failure(&self) -> bool {
        self.kind.is_integrity_failure()
    }

    /// Returns `true` if this is a read or write failure.
    #[must_use]
    pub const fn is_io_failure(&self) -> bool {
        self.kind.is_io_failure()
    }

    /// Adds context to the error.
    #[must_use]
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }

    /// Returns the error context, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl From<TicketErrorKind> for TicketError {
    fn from(kind: TicketErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }

        Ok(())
    }
}

impl std::error::Error for TicketError {}

/// Result type for ticket operations.
pub type TicketResult<T> = Result<T, TicketError>;
