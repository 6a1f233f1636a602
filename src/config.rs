//! Ticket policy configuration.
//!
//! [`TicketConfig`] carries every policy constant the issuer and validator
//! consult: which application and format version the tag must carry, the
//! safety ceilings, and the double-tap cooldown. Key material is never part
//! of a configuration; it is provisioned separately as a
//! [`KeyRing`](crate::security::KeyRing).
//!
//! With the `config-file` feature, configurations load from TOML:
//!
//! ```toml
//! app_tag = "BpAl"
//! version = "v1.0"
//! max_remaining_tickets = 50
//! max_valid_days = 90
//! cooldown_secs = 5
//! auth0_page = 26
//! ```

use crate::layout::{Label, TICKET_START_PAGE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lowest page AUTH0 may name; pages below it hold the UID and lock bits.
pub const MIN_AUTH0_PAGE: u8 = 3;

/// Policy for issuing and validating tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketConfig {
    /// Application tag every ticket carries.
    pub app_tag: Label,
    /// Supported ticket format version.
    pub version: Label,
    /// Ceiling on remaining uses after any issue or top-up.
    pub max_remaining_tickets: u32,
    /// Ceiling on a ticket's validity window in days.
    pub max_valid_days: u32,
    /// Minimum seconds between two accepted uses.
    pub cooldown_secs: u32,
    /// First page that requires authentication once memory is protected.
    pub auth0_page: u8,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            app_tag: Label::from_bytes(*b"BpAl"),
            version: Label::from_bytes(*b"v1.0"),
            max_remaining_tickets: 50,
            max_valid_days: 90,
            cooldown_secs: 5,
            auth0_page: TICKET_START_PAGE,
        }
    }
}

impl TicketConfig {
    /// Sets the application tag.
    #[must_use]
    pub const fn with_app_tag(mut self, app_tag: Label) -> Self {
        self.app_tag = app_tag;
        self
    }

    /// Sets the supported format version.
    #[must_use]
    pub const fn with_version(mut self, version: Label) -> Self {
        self.version = version;
        self
    }

    /// Sets the remaining-uses ceiling.
    #[must_use]
    pub const fn with_max_remaining_tickets(mut self, max: u32) -> Self {
        self.max_remaining_tickets = max;
        self
    }

    /// Sets the validity ceiling in days.
    #[must_use]
    pub const fn with_max_valid_days(mut self, days: u32) -> Self {
        self.max_valid_days = days;
        self
    }

    /// Sets the double-tap cooldown in seconds.
    #[must_use]
    pub const fn with_cooldown_secs(mut self, secs: u32) -> Self {
        self.cooldown_secs = secs;
        self
    }

    /// Sets the AUTH0 page.
    #[must_use]
    pub const fn with_auth0_page(mut self, page: u8) -> Self {
        self.auth0_page = page;
        self
    }

    /// The double-tap cooldown as a duration.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs as u64)
    }

    /// Checks that the policy is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_tag.text().is_none() {
            return Err(ConfigError::invalid("app_tag", "must be four letters, digits or '.'"));
        }
        if self.version.text().is_none() {
            return Err(ConfigError::invalid("version", "must be four letters, digits or '.'"));
        }
        if self.max_remaining_tickets == 0 {
            return Err(ConfigError::invalid(
                "max_remaining_tickets",
                "must be at least 1",
            ));
        }
        if self.max_valid_days == 0 {
            return Err(ConfigError::invalid("max_valid_days", "must be at least 1"));
        }
        if !(MIN_AUTH0_PAGE..=TICKET_START_PAGE).contains(&self.auth0_page) {
            return Err(ConfigError::invalid(
                "auth0_page",
                format!("must be between {MIN_AUTH0_PAGE} and {TICKET_START_PAGE}"),
            ));
        }
        Ok(())
    }

    /// Parses and validates a configuration from TOML. Missing keys take
    /// their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing error.
    #[cfg(feature = "config-file")]
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds an unusable value.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
