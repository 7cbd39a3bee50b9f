//! Error classification shared across crates.
//!
//! - [`Severity`]: how an error is handled and at which level it is logged
//! - [`StartupError`]: failures that abort the process before any network activity
//!
//! Each crate defines its own `thiserror` enum and maps its variants onto a
//! [`Severity`], so handlers at the connection boundary can decide uniformly
//! whether to warn, escalate, or stay silent.

use std::fmt;

use thiserror::Error;

/// Handling class of an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Expected during normal operation: log a warning and drop the input.
    Transient,
    /// Out-of-order or duplicate packet numbering: drop.
    Sequencing,
    /// Broken protocol contract: log at error level, keep running.
    Violation,
    /// The owning actor was destroyed. Not an error; swallow silently.
    Cancelled,
    /// Startup configuration error: abort the process.
    Fatal,
}

impl Severity {
    /// Whether the error should be surfaced to the operator at all.
    #[must_use]
    pub fn is_reportable(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether the error should be logged at `error` level.
    #[must_use]
    pub fn is_escalated(self) -> bool {
        matches!(self, Self::Violation | Self::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transient => "transient",
            Self::Sequencing => "sequencing",
            Self::Violation => "violation",
            Self::Cancelled => "cancelled",
            Self::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// A required local transport does not exist on this host platform.
    #[error("unsupported platform `{platform}` for local transport `{transport}`")]
    UnsupportedPlatform {
        /// Transport name (`driver`, `feeder`).
        transport: String,
        /// Host platform as reported by `std::env::consts::OS`.
        platform: String,
    },

    /// A setting failed validation.
    #[error("invalid setting `{key}`: {message}")]
    InvalidSetting {
        /// Dotted settings key.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}

impl StartupError {
    /// Always [`Severity::Fatal`].
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}
