//! Inbound datagram decoding.

use bytes::Buf;
use vrtrack_core::Quaternion;

use crate::errors::{DecodeError, to_hex};
use crate::packet::{Handshake, InboundPacket, Packet, RotationDataType, UserAction, packet_type};

const HEADER_LEN: usize = 12;

/// Decode one datagram.
pub fn decode(datagram: &[u8]) -> Result<Packet, DecodeError> {
    if datagram.len() < HEADER_LEN {
        return Err(DecodeError::TruncatedHeader {
            len: datagram.len(),
        });
    }

    let mut buf = datagram;
    let id = buf.get_u32();
    let number = buf.get_i64();

    let body = match id {
        packet_type::HEARTBEAT => InboundPacket::Heartbeat,
        packet_type::HANDSHAKE => InboundPacket::Handshake(decode_handshake(buf)),
        packet_type::PING_PONG => {
            let mut r = Reader::new("ping_pong", buf);
            InboundPacket::PingPong {
                ping_id: r.i32()?,
            }
        }
        packet_type::BATTERY_LEVEL => decode_battery(buf)?,
        packet_type::SENSOR_INFO => {
            let mut r = Reader::new("sensor_info", buf);
            InboundPacket::SensorInfo {
                sensor_id: r.u8()?,
                status: r.u8()?,
                imu_type: r.opt_u8(),
            }
        }
        packet_type::ROTATION => legacy_rotation("rotation", 0, buf)?,
        packet_type::ROTATION_2 => legacy_rotation("rotation_2", 1, buf)?,
        packet_type::ROTATION_DATA => {
            let mut r = Reader::new("rotation_data", buf);
            InboundPacket::Rotation {
                sensor_id: r.u8()?,
                data_type: RotationDataType::from(r.u8()?),
                rotation: r.quaternion()?,
                accuracy: r.opt_u8(),
            }
        }
        packet_type::SIGNAL_STRENGTH => {
            let mut r = Reader::new("signal_strength", buf);
            InboundPacket::SignalStrength {
                sensor_id: r.u8()?,
                signal: r.i8()?,
            }
        }
        packet_type::USER_ACTION => {
            let mut r = Reader::new("user_action", buf);
            InboundPacket::UserAction(UserAction::from(r.u8()?))
        }
        _ => {
            return Err(DecodeError::UnknownPacketType {
                id,
                len: datagram.len(),
                hex: to_hex(datagram),
            });
        }
    };

    Ok(Packet { number, body })
}

fn legacy_rotation(
    kind: &'static str,
    sensor_id: u8,
    payload: &[u8],
) -> Result<InboundPacket, DecodeError> {
    let mut r = Reader::new(kind, payload);
    Ok(InboundPacket::Rotation {
        sensor_id,
        data_type: RotationDataType::Normal,
        rotation: r.quaternion()?,
        accuracy: None,
    })
}

fn decode_battery(payload: &[u8]) -> Result<InboundPacket, DecodeError> {
    let mut r = Reader::new("battery_level", payload);
    if payload.len() >= 8 {
        let voltage = r.f32()?;
        let level = r.f32()?;
        Ok(InboundPacket::BatteryLevel {
            voltage: Some(voltage),
            level,
        })
    } else {
        Ok(InboundPacket::BatteryLevel {
            voltage: None,
            level: r.f32()?,
        })
    }
}

/// Every field is read only while enough bytes remain; old firmware stops early.
fn decode_handshake(payload: &[u8]) -> Handshake {
    let mut buf = payload;

    let board = opt_i32(&mut buf);
    let imu = opt_i32(&mut buf);
    let mcu = opt_i32(&mut buf);
    let imu_info = (buf.remaining() >= 12).then(|| [buf.get_i32(), buf.get_i32(), buf.get_i32()]);
    let firmware_build = opt_i32(&mut buf);

    let mut firmware = None;
    if buf.has_remaining() {
        let len = usize::from(buf.get_u8());
        if buf.remaining() >= len {
            firmware = Some(String::from_utf8_lossy(&buf[..len]).into_owned());
            buf.advance(len);
        }
    }

    let mac = (buf.remaining() >= 6).then(|| {
        let mut mac = [0u8; 6];
        buf.copy_to_slice(&mut mac);
        mac
    });

    Handshake {
        board,
        imu,
        mcu,
        imu_info,
        firmware_build,
        firmware,
        mac,
    }
}

fn opt_i32(buf: &mut &[u8]) -> Option<i32> {
    (buf.remaining() >= 4).then(|| buf.get_i32())
}

/// Bounds-checked big-endian reads over a payload.
struct Reader<'a> {
    kind: &'static str,
    total: usize,
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(kind: &'static str, buf: &'a [u8]) -> Self {
        Self {
            kind,
            total: buf.len(),
            buf,
        }
    }

    fn need(&self, n: usize) -> Result<(), DecodeError> {
        if self.buf.remaining() < n {
            return Err(DecodeError::TruncatedPayload {
                kind: self.kind,
                needed: self.total - self.buf.remaining() + n,
                got: self.total,
            });
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn i8(&mut self) -> Result<i8, DecodeError> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    fn f32(&mut self) -> Result<f32, DecodeError> {
        self.need(4)?;
        Ok(self.buf.get_f32())
    }

    fn opt_u8(&mut self) -> Option<u8> {
        self.buf.has_remaining().then(|| self.buf.get_u8())
    }

    fn quaternion(&mut self) -> Result<Quaternion, DecodeError> {
        self.need(16)?;
        let x = self.buf.get_f32();
        let y = self.buf.get_f32();
        let z = self.buf.get_f32();
        let w = self.buf.get_f32();
        Ok(Quaternion::new(x, y, z, w))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use bytes::BufMut;
    use proptest::prelude::*;

    fn datagram(id: u32, number: i64, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.put_u32(id);
        buf.put_i64(number);
        buf.put_slice(payload);
        buf
    }

    fn full_handshake_payload(firmware: &str, build: i32, mac: [u8; 6]) -> Vec<u8> {
        let mut p = Vec::new();
        p.put_i32(2); // board
        p.put_i32(4); // imu
        p.put_i32(1); // mcu
        p.put_i32(0);
        p.put_i32(0);
        p.put_i32(0);
        p.put_i32(build);
        p.put_u8(u8::try_from(firmware.len()).unwrap());
        p.put_slice(firmware.as_bytes());
        p.put_slice(&mac);
        p
    }

    #[test]
    fn header_too_short() {
        assert_matches!(decode(&[0, 0, 0]), Err(DecodeError::TruncatedHeader { len: 3 }));
    }

    #[test]
    fn heartbeat_keeps_packet_number() {
        let packet = decode(&datagram(packet_type::HEARTBEAT, 42, &[])).unwrap();
        assert_eq!(packet.number, 42);
        assert_eq!(packet.body, InboundPacket::Heartbeat);
    }

    #[test]
    fn full_handshake() {
        let payload = full_handshake_payload("0.4.0", 17, [1, 2, 3, 4, 5, 6]);
        let packet = decode(&datagram(packet_type::HANDSHAKE, 0, &payload)).unwrap();
        let InboundPacket::Handshake(hs) = packet.body else {
            panic!("expected handshake");
        };
        assert_eq!(hs.board, Some(2));
        assert_eq!(hs.imu, Some(4));
        assert_eq!(hs.firmware_build, Some(17));
        assert_eq!(hs.firmware.as_deref(), Some("0.4.0"));
        assert_eq!(hs.mac_string(), "01:02:03:04:05:06");
        assert!(!hs.is_legacy());
    }

    #[test]
    fn short_handshake_is_legacy() {
        let mut payload = Vec::new();
        payload.put_i32(1);
        payload.put_i32(3);
        let packet = decode(&datagram(packet_type::HANDSHAKE, 0, &payload)).unwrap();
        let InboundPacket::Handshake(hs) = packet.body else {
            panic!("expected handshake");
        };
        assert_eq!(hs.imu, Some(3));
        assert_eq!(hs.mcu, None);
        assert_eq!(hs.mac, None);
        assert!(hs.is_legacy());
    }

    #[test]
    fn battery_with_and_without_voltage() {
        let mut both = Vec::new();
        both.put_f32(3.7);
        both.put_f32(0.5);
        let packet = decode(&datagram(packet_type::BATTERY_LEVEL, 1, &both)).unwrap();
        assert_eq!(
            packet.body,
            InboundPacket::BatteryLevel {
                voltage: Some(3.7),
                level: 0.5
            }
        );

        let mut level_only = Vec::new();
        level_only.put_f32(0.25);
        let packet = decode(&datagram(packet_type::BATTERY_LEVEL, 2, &level_only)).unwrap();
        assert_eq!(
            packet.body,
            InboundPacket::BatteryLevel {
                voltage: None,
                level: 0.25
            }
        );
    }

    #[test]
    fn sensor_info_optional_imu_type() {
        let packet = decode(&datagram(packet_type::SENSOR_INFO, 3, &[1, 1, 4])).unwrap();
        assert_eq!(
            packet.body,
            InboundPacket::SensorInfo {
                sensor_id: 1,
                status: 1,
                imu_type: Some(4)
            }
        );
        let packet = decode(&datagram(packet_type::SENSOR_INFO, 3, &[0, 2])).unwrap();
        assert_eq!(
            packet.body,
            InboundPacket::SensorInfo {
                sensor_id: 0,
                status: 2,
                imu_type: None
            }
        );
    }

    #[test]
    fn legacy_rotations_are_scoped_to_fixed_sensors() {
        let mut quat = Vec::new();
        for v in [0.0_f32, 0.0, 0.0, 1.0] {
            quat.put_f32(v);
        }
        let first = decode(&datagram(packet_type::ROTATION, 5, &quat)).unwrap();
        assert_matches!(first.body, InboundPacket::Rotation { sensor_id: 0, .. });
        let second = decode(&datagram(packet_type::ROTATION_2, 6, &quat)).unwrap();
        assert_matches!(second.body, InboundPacket::Rotation { sensor_id: 1, .. });
    }

    #[test]
    fn rotation_data_with_accuracy() {
        let mut payload = vec![2, 1];
        for v in [0.5_f32, 0.5, 0.5, 0.5] {
            payload.put_f32(v);
        }
        payload.put_u8(3);
        let packet = decode(&datagram(packet_type::ROTATION_DATA, 9, &payload)).unwrap();
        assert_eq!(
            packet.body,
            InboundPacket::Rotation {
                sensor_id: 2,
                data_type: RotationDataType::Normal,
                rotation: Quaternion::new(0.5, 0.5, 0.5, 0.5),
                accuracy: Some(3),
            }
        );
    }

    #[test]
    fn truncated_rotation() {
        let err = decode(&datagram(packet_type::ROTATION_DATA, 1, &[0, 1, 0, 0])).unwrap_err();
        assert_matches!(
            err,
            DecodeError::TruncatedPayload {
                kind: "rotation_data",
                needed: 18,
                got: 4
            }
        );
    }

    #[test]
    fn signal_strength_is_signed() {
        let packet = decode(&datagram(packet_type::SIGNAL_STRENGTH, 1, &[0, 0xC4])).unwrap();
        assert_eq!(
            packet.body,
            InboundPacket::SignalStrength {
                sensor_id: 0,
                signal: -60
            }
        );
    }

    #[test]
    fn user_action() {
        let packet = decode(&datagram(packet_type::USER_ACTION, 1, &[3])).unwrap();
        assert_eq!(packet.body, InboundPacket::UserAction(UserAction::FastReset));
    }

    #[test]
    fn unknown_type_reports_hex() {
        let raw = datagram(200, 1, &[0xAB]);
        let err = decode(&raw).unwrap_err();
        assert_matches!(
            err,
            DecodeError::UnknownPacketType { id: 200, len: 13, ref hex } if hex.ends_with("ab")
        );
    }

    proptest! {
        #[test]
        fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode(&data);
        }

        #[test]
        fn ping_id_survives(id in any::<i32>(), number in any::<i64>()) {
            let packet = decode(&datagram(packet_type::PING_PONG, number, &id.to_be_bytes())).unwrap();
            prop_assert_eq!(packet.number, number);
            prop_assert_eq!(packet.body, InboundPacket::PingPong { ping_id: id });
        }
    }
}
