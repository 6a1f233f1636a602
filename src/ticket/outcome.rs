//! Results of ticket operations and their user-facing rendering.

use crate::error::TicketResult;
use crate::types::UnixTime;
use serde::Serialize;
use std::fmt;

/// A successful `issue` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IssueOutcome {
    /// A new ticket replaced a blank or expired one.
    Issued {
        /// Uses granted.
        uses: u32,
        /// Validity window, after clamping.
        valid_for_days: u32,
    },
    /// Uses were added to a live ticket.
    ToppedUp {
        /// Uses added.
        added: u32,
        /// Uses left before the top-up.
        previous_remaining: u32,
        /// Uses left after the top-up.
        remaining: u32,
        /// Validity window, after clamping.
        valid_for_days: u32,
    },
}

impl IssueOutcome {
    /// Uses left on the tag after the operation.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        match *self {
            Self::Issued { uses, .. } => uses,
            Self::ToppedUp { remaining, .. } => remaining,
        }
    }

    /// Validity window written to the tag.
    #[must_use]
    pub const fn valid_for_days(&self) -> u32 {
        match *self {
            Self::Issued { valid_for_days, .. } | Self::ToppedUp { valid_for_days, .. } => {
                valid_for_days
            }
        }
    }
}

impl fmt::Display for IssueOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Issued { uses, .. } => write!(f, "{uses} new tickets issued."),
            Self::ToppedUp {
                added,
                previous_remaining,
                ..
            } => write!(
                f,
                "{added} tickets added over {previous_remaining} non-expired tickets."
            ),
        }
    }
}

/// An accepted use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Validated {
    /// Uses left after this one.
    pub remaining: u32,
    /// End of the validity window.
    pub expires_at: UnixTime,
    /// This use started the validity window.
    pub first_use: bool,
    /// The best-effort bookkeeping writes (last use, usage log) all landed.
    pub bookkeeping_written: bool,
}

impl fmt::Display for Validated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_use {
            f.write_str("Ticket validated (1st use).\n")?;
        } else {
            f.write_str("Ticket validated.\n")?;
        }
        write!(
            f,
            "{} tickets remaining.\nExpires on: {}",
            self.remaining,
            self.expires_at.display_utc()
        )
    }
}

/// A successful administrative operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminOutcome {
    /// The ticket region was zeroed.
    Formatted,
    /// AUTH0/AUTH1 were written.
    Protected,
    /// AUTH0/AUTH1 already held the target values.
    AlreadyProtected,
}

impl fmt::Display for AdminOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Formatted => "Formatted the card.",
            Self::Protected => "Memory protection enabled.",
            Self::AlreadyProtected => "Memory protection already enabled.",
        })
    }
}

/// A short status message plus success flag, for display.
///
/// # Example
///
/// ```
/// use tagticket::ticket::StatusReport;
/// use tagticket::{TicketError, TicketErrorKind, TicketResult};
///
/// let result: TicketResult<u32> = Err(TicketError::new(TicketErrorKind::Expired));
/// let report = StatusReport::from_result(&result);
/// assert!(!report.success);
/// assert_eq!(report.message, "tickets expired");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Whether the operation succeeded.
    pub success: bool,
    /// What to show the user.
    pub message: String,
}

impl StatusReport {
    /// Renders any operation result.
    #[must_use]
    pub fn from_result<T: fmt::Display>(result: &TicketResult<T>) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                message: value.to_string(),
            },
            Err(err) => Self {
                success: false,
                message: err.to_string(),
            },
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
