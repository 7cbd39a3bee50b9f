//! Server error types.

use std::net::SocketAddr;

use thiserror::Error;
use vrtrack_core::StartupError;
use vrtrack_runtime::RuntimeError;

/// Errors surfaced by the server layer.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The UDP socket could not be bound.
    #[error("failed to bind UDP socket on {address}: {source}")]
    Bind {
        /// Requested address.
        address: SocketAddr,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Startup configuration problem.
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// Runtime actor failure.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
