//! Server-to-tracker packets.

use bytes::{BufMut, Bytes, BytesMut};

use crate::packet::packet_type;

/// Greeting the firmware expects in the handshake acknowledgment.
const HANDSHAKE_GREETING: &[u8] = b"Hey OVR =D 5";

/// Packets the server sends to a tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutboundPacket {
    /// Acknowledges a handshake. Always sent with packet number 0.
    HandshakeAck,
    /// Heartbeat carrying the ping id the tracker must echo back.
    Heartbeat {
        /// Id the pong must carry.
        ping_id: i32,
    },
    /// Acknowledges a sensor-info report.
    SensorInfoAck {
        /// Local sensor index.
        sensor_id: u8,
        /// Raw status byte as reported.
        status: u8,
    },
}

impl OutboundPacket {
    /// Wire type id.
    pub fn type_id(&self) -> u32 {
        match self {
            Self::HandshakeAck => packet_type::HANDSHAKE,
            Self::Heartbeat { .. } => packet_type::PING_PONG,
            Self::SensorInfoAck { .. } => packet_type::SENSOR_INFO,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HandshakeAck => "handshake_ack",
            Self::Heartbeat { .. } => "heartbeat",
            Self::SensorInfoAck { .. } => "sensor_info_ack",
        }
    }

    /// Encode with the given packet number.
    pub fn encode(&self, number: i64) -> Bytes {
        let mut buf = BytesMut::with_capacity(12 + HANDSHAKE_GREETING.len());
        buf.put_u32(self.type_id());
        buf.put_i64(number);
        match *self {
            Self::HandshakeAck => buf.put_slice(HANDSHAKE_GREETING),
            Self::Heartbeat { ping_id } => buf.put_i32(ping_id),
            Self::SensorInfoAck { sensor_id, status } => {
                buf.put_u8(sensor_id);
                buf.put_u8(status);
            }
        }
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::packet::InboundPacket;

    #[test]
    fn handshake_ack_layout() {
        let bytes = OutboundPacket::HandshakeAck.encode(0);
        assert_eq!(&bytes[..4], &[0, 0, 0, 3]);
        assert_eq!(&bytes[4..12], &[0; 8]);
        assert_eq!(&bytes[12..], b"Hey OVR =D 5");
    }

    #[test]
    fn heartbeat_layout() {
        let bytes = OutboundPacket::Heartbeat { ping_id: 7 }.encode(12);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..4], &[0, 0, 0, 10]);
        assert_eq!(&bytes[4..12], &12_i64.to_be_bytes());
        assert_eq!(&bytes[12..], &7_i32.to_be_bytes());
    }

    #[test]
    fn heartbeat_is_readable_as_pong() {
        // Firmware echoes the heartbeat verbatim, so the server must decode it.
        let bytes = OutboundPacket::Heartbeat { ping_id: 3 }.encode(1);
        let packet = decode(&bytes).unwrap();
        assert_eq!(packet.body, InboundPacket::PingPong { ping_id: 3 });
    }

    #[test]
    fn sensor_info_ack_layout() {
        let bytes = OutboundPacket::SensorInfoAck {
            sensor_id: 2,
            status: 1,
        }
        .encode(5);
        assert_eq!(&bytes[..4], &[0, 0, 0, 15]);
        assert_eq!(&bytes[12..], &[2, 1]);
    }
}
