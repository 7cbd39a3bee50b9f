//! Decode errors.

use thiserror::Error;
use vrtrack_core::Severity;

/// Reasons a datagram could not be decoded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Shorter than the 12-byte header.
    #[error("datagram of {len} bytes is shorter than the packet header")]
    TruncatedHeader {
        /// Datagram length.
        len: usize,
    },

    /// Payload shorter than the packet type requires.
    #[error("{kind} payload needs {needed} bytes, got {got}")]
    TruncatedPayload {
        /// Packet name.
        kind: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        got: usize,
    },

    /// Type id this server does not handle.
    #[error("unknown packet type {id} ({len} bytes): {hex}")]
    UnknownPacketType {
        /// Type id.
        id: u32,
        /// Datagram length.
        len: usize,
        /// Whole datagram as lowercase hex.
        hex: String,
    },
}

impl DecodeError {
    /// Malformed input is routine on an unreliable transport.
    pub fn severity(&self) -> Severity {
        Severity::Transient
    }
}

/// Lowercase hex of a byte slice.
pub(crate) fn to_hex(data: &[u8]) -> String {
    use std::fmt::Write;

    data.iter().fold(String::with_capacity(data.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
