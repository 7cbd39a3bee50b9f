//! Packet type ids and decoded packet bodies.

use vrtrack_core::Quaternion;
use vrtrack_core::constants::NULL_MAC;

/// Packet type ids on the wire.
pub mod packet_type {
    /// Tracker keep-alive (inbound, empty payload).
    pub const HEARTBEAT: u32 = 0;
    /// Legacy rotation of sensor 0.
    pub const ROTATION: u32 = 1;
    /// Handshake (inbound) and handshake acknowledgment (outbound).
    pub const HANDSHAKE: u32 = 3;
    /// Ping id exchange used for round-trip measurement.
    pub const PING_PONG: u32 = 10;
    /// Battery level and voltage.
    pub const BATTERY_LEVEL: u32 = 12;
    /// Sensor status report (inbound) and its acknowledgment (outbound).
    pub const SENSOR_INFO: u32 = 15;
    /// Legacy rotation of sensor 1.
    pub const ROTATION_2: u32 = 16;
    /// Sensor-scoped rotation.
    pub const ROTATION_DATA: u32 = 17;
    /// Wi-Fi signal strength.
    pub const SIGNAL_STRENGTH: u32 = 19;
    /// Button press on the tracker.
    pub const USER_ACTION: u32 = 21;
}

/// A decoded inbound datagram.
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    /// Sender-assigned packet number.
    pub number: i64,
    /// Decoded payload.
    pub body: InboundPacket,
}

/// Inbound packet payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundPacket {
    /// Keep-alive.
    Heartbeat,
    /// Identity announcement from a tracker.
    Handshake(Handshake),
    /// Reply to a server heartbeat.
    PingPong {
        /// Echoed ping id.
        ping_id: i32,
    },
    /// Battery report.
    BatteryLevel {
        /// Volts, absent on old firmware.
        voltage: Option<f32>,
        /// Charge in `0.0..=1.0`.
        level: f32,
    },
    /// Sensor status report.
    SensorInfo {
        /// Local sensor index.
        sensor_id: u8,
        /// Raw status byte.
        status: u8,
        /// Raw IMU type, absent on old firmware.
        imu_type: Option<u8>,
    },
    /// Rotation of one sensor.
    Rotation {
        /// Local sensor index.
        sensor_id: u8,
        /// Kind of rotation carried.
        data_type: RotationDataType,
        /// Orientation.
        rotation: Quaternion,
        /// Magnetometer accuracy, when reported.
        accuracy: Option<u8>,
    },
    /// Wi-Fi signal strength.
    SignalStrength {
        /// Local sensor index.
        sensor_id: u8,
        /// dBm.
        signal: i8,
    },
    /// Button press.
    UserAction(UserAction),
}

impl InboundPacket {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Handshake(_) => "handshake",
            Self::PingPong { .. } => "ping_pong",
            Self::BatteryLevel { .. } => "battery_level",
            Self::SensorInfo { .. } => "sensor_info",
            Self::Rotation { .. } => "rotation",
            Self::SignalStrength { .. } => "signal_strength",
            Self::UserAction(_) => "user_action",
        }
    }
}

/// Kind of rotation in a rotation packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationDataType {
    /// Fused sensor orientation.
    Normal,
    /// Correction quaternion.
    Correction,
    /// Unrecognized value.
    Other(u8),
}

impl From<u8> for RotationDataType {
    fn from(raw: u8) -> Self {
        match raw {
            1 => Self::Normal,
            2 => Self::Correction,
            other => Self::Other(other),
        }
    }
}

/// Button actions a tracker can send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserAction {
    /// Full reset.
    Reset,
    /// Yaw-only reset.
    FastReset,
    /// Mounting calibration.
    MountingReset,
    /// Unrecognized action id.
    Unknown(u8),
}

impl From<u8> for UserAction {
    fn from(raw: u8) -> Self {
        match raw {
            2 => Self::Reset,
            3 => Self::FastReset,
            4 => Self::MountingReset,
            other => Self::Unknown(other),
        }
    }
}

/// Handshake payload. Older firmware sends shorter handshakes, so every field
/// after the header is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Handshake {
    /// Board type.
    pub board: Option<i32>,
    /// IMU type of sensor 0.
    pub imu: Option<i32>,
    /// Microcontroller type.
    pub mcu: Option<i32>,
    /// IMU info triple.
    pub imu_info: Option<[i32; 3]>,
    /// Firmware build number.
    pub firmware_build: Option<i32>,
    /// Firmware name.
    pub firmware: Option<String>,
    /// Device MAC address.
    pub mac: Option<[u8; 6]>,
}

/// First firmware build that reports sensors with sensor-info packets.
const SENSOR_INFO_FIRMWARE_BUILD: i32 = 9;

impl Handshake {
    /// MAC as colon-separated lowercase hex; the null MAC when absent.
    pub fn mac_string(&self) -> String {
        match self.mac {
            Some(mac) => mac
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(":"),
            None => NULL_MAC.to_string(),
        }
    }

    /// Firmware that never sends sensor-info packets for sensor 0.
    pub fn is_legacy(&self) -> bool {
        let no_name = self.firmware.as_deref().is_none_or(str::is_empty);
        let old_build = self
            .firmware_build
            .is_none_or(|build| build < SENSOR_INFO_FIRMWARE_BUILD);
        no_name || old_build
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_string_formats_hex() {
        let hs = Handshake {
            mac: Some([0xde, 0xad, 0xbe, 0xef, 0x00, 0x0a]),
            ..Handshake::default()
        };
        assert_eq!(hs.mac_string(), "de:ad:be:ef:00:0a");
    }

    #[test]
    fn missing_mac_is_null_mac() {
        assert_eq!(Handshake::default().mac_string(), NULL_MAC);
    }

    #[test]
    fn legacy_detection() {
        let modern = Handshake {
            firmware: Some("0.4.0".into()),
            firmware_build: Some(17),
            ..Handshake::default()
        };
        assert!(!modern.is_legacy());

        let old_build = Handshake {
            firmware_build: Some(8),
            ..modern.clone()
        };
        assert!(old_build.is_legacy());

        let no_name = Handshake {
            firmware: Some(String::new()),
            ..modern
        };
        assert!(no_name.is_legacy());
        assert!(Handshake::default().is_legacy());
    }

    #[test]
    fn user_action_ids() {
        assert_eq!(UserAction::from(2), UserAction::Reset);
        assert_eq!(UserAction::from(3), UserAction::FastReset);
        assert_eq!(UserAction::from(4), UserAction::MountingReset);
        assert_eq!(UserAction::from(9), UserAction::Unknown(9));
    }
}
