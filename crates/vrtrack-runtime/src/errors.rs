//! Runtime error types.

use std::net::SocketAddr;

use thiserror::Error;
use vrtrack_core::{Handle, Severity};

/// Errors raised by actors and protocol handlers.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The target actor was destroyed. Callers ignore this.
    #[error("operation was cancelled")]
    Cancelled,

    /// A peer broke the protocol contract.
    #[error("protocol violation from {address}: {reason}")]
    ProtocolViolation {
        /// Peer address.
        address: SocketAddr,
        /// What went wrong.
        reason: &'static str,
    },

    /// A referenced tracker is not (or no longer) registered.
    #[error("unknown tracker {0}")]
    UnknownTracker(String),

    /// A referenced device is not (or no longer) registered.
    #[error("unknown device {0}")]
    UnknownDevice(Handle),

    /// Configuration store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RuntimeError {
    /// Whether this error only reports actor destruction.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Handling class for logging decisions.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Cancelled => Severity::Cancelled,
            Self::ProtocolViolation { .. } => Severity::Violation,
            Self::UnknownTracker(_) | Self::UnknownDevice(_) | Self::Store(_) => {
                Severity::Transient
            }
        }
    }
}

/// Configuration store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the file failed.
    #[error("config store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid configuration JSON.
    #[error("config store JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities() {
        assert_eq!(RuntimeError::Cancelled.severity(), Severity::Cancelled);
        assert!(RuntimeError::Cancelled.is_cancelled());

        let violation = RuntimeError::ProtocolViolation {
            address: "10.0.0.5:6969".parse().unwrap(),
            reason: "sensor info before handshake",
        };
        assert_eq!(violation.severity(), Severity::Violation);
        assert!(!violation.is_cancelled());
        assert_eq!(
            violation.to_string(),
            "protocol violation from 10.0.0.5:6969: sensor info before handshake"
        );

        assert_eq!(
            RuntimeError::UnknownDevice(Handle::new(3)).severity(),
            Severity::Transient
        );
    }

    #[test]
    fn store_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: RuntimeError = StoreError::from(io).into();
        assert!(matches!(err, RuntimeError::Store(StoreError::Io(_))));
        assert_eq!(err.severity(), Severity::Transient);
    }
}
