//! # vrtrack-protocol
//!
//! Codec for the tracker firmware's UDP protocol.
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Packet type id (big-endian)
//! 4       8     Packet number (big-endian)
//! 12      N     Type-specific payload
//! ```
//!
//! - [`decode`] turns a datagram into a [`Packet`] or a [`DecodeError`]
//! - [`OutboundPacket::encode`] writes server-to-tracker packets

#![deny(unsafe_code)]

pub mod decode;
pub mod encode;
pub mod errors;
pub mod packet;

pub use decode::decode;
pub use encode::OutboundPacket;
pub use errors::DecodeError;
pub use packet::{Handshake, InboundPacket, Packet, RotationDataType, UserAction, packet_type};
