//! Domain enums and small geometry types.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Origin
// ─────────────────────────────────────────────────────────────────────────────

/// Which input path created a device or tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Network tracker speaking the UDP firmware protocol.
    Udp,
    /// Local driver pipe.
    Driver,
    /// Local feeder pipe.
    Feeder,
}

impl Origin {
    /// Lowercase name used in hardware addresses and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Driver => "driver",
            Self::Feeder => "feeder",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TrackerStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Connection status of a tracker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerStatus {
    /// No status reported yet.
    #[default]
    None,
    /// Sensor present but not delivering data.
    Disconnected,
    /// Delivering data.
    Ok,
    /// Temporarily busy (calibrating).
    Busy,
    /// Sensor reported a fault.
    Error,
    /// Optical tracking lost line of sight.
    Occluded,
}

impl TrackerStatus {
    /// Map the firmware's sensor-status byte.
    #[must_use]
    pub fn from_sensor_status(raw: u8) -> Self {
        match raw {
            0 => Self::Disconnected,
            1 => Self::Ok,
            2 => Self::Error,
            _ => Self::None,
        }
    }

    /// Map a driver/feeder status value, which is offset by one from ours.
    #[must_use]
    pub fn from_feeder(raw: u32) -> Self {
        match raw {
            0 => Self::Disconnected,
            1 => Self::Ok,
            2 => Self::Busy,
            3 => Self::Error,
            4 => Self::Occluded,
            _ => Self::None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ImuType
// ─────────────────────────────────────────────────────────────────────────────

/// Sensor chip reported by the firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImuType {
    /// Not reported.
    Unknown,
    /// InvenSense MPU-9250.
    Mpu9250,
    /// InvenSense MPU-6500.
    Mpu6500,
    /// Bosch BNO080.
    Bno080,
    /// Bosch BNO085.
    Bno085,
    /// Bosch BNO055.
    Bno055,
    /// InvenSense MPU-6050.
    Mpu6050,
    /// Bosch BNO086.
    Bno086,
    /// Bosch BMI160.
    Bmi160,
    /// TDK ICM-20948.
    Icm20948,
    /// Id this server does not know by name.
    Other(u8),
}

impl From<u8> for ImuType {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::Unknown,
            1 => Self::Mpu9250,
            2 => Self::Mpu6500,
            3 => Self::Bno080,
            4 => Self::Bno085,
            5 => Self::Bno055,
            6 => Self::Mpu6050,
            7 => Self::Bno086,
            8 => Self::Bmi160,
            9 => Self::Icm20948,
            other => Self::Other(other),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BodyPart
// ─────────────────────────────────────────────────────────────────────────────

/// Body location a tracker is assigned to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum BodyPart {
    #[default]
    None,
    Head,
    Neck,
    Chest,
    Waist,
    Hip,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
    LeftFoot,
    RightFoot,
    LeftController,
    RightController,
    LeftLowerArm,
    RightLowerArm,
    LeftUpperArm,
    RightUpperArm,
    LeftHand,
    RightHand,
    LeftShoulder,
    RightShoulder,
}

/// Role announced by a driver/feeder when it adds a tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TrackerRole {
    None,
    Waist,
    LeftFoot,
    RightFoot,
    Chest,
    LeftKnee,
    RightKnee,
    LeftElbow,
    RightElbow,
    LeftShoulder,
    RightShoulder,
    LeftHand,
    RightHand,
    LeftController,
    RightController,
    Head,
    Neck,
    Camera,
    Keyboard,
    Hmd,
    Beacon,
    GenericController,
}

impl TrackerRole {
    /// Decode the wire value; unknown values yield `None`.
    #[must_use]
    pub fn from_u32(raw: u32) -> Option<Self> {
        let role = match raw {
            0 => Self::None,
            1 => Self::Waist,
            2 => Self::LeftFoot,
            3 => Self::RightFoot,
            4 => Self::Chest,
            5 => Self::LeftKnee,
            6 => Self::RightKnee,
            7 => Self::LeftElbow,
            8 => Self::RightElbow,
            9 => Self::LeftShoulder,
            10 => Self::RightShoulder,
            11 => Self::LeftHand,
            12 => Self::RightHand,
            13 => Self::LeftController,
            14 => Self::RightController,
            15 => Self::Head,
            16 => Self::Neck,
            17 => Self::Camera,
            18 => Self::Keyboard,
            19 => Self::Hmd,
            20 => Self::Beacon,
            21 => Self::GenericController,
            _ => return None,
        };
        Some(role)
    }

    /// Body part a tracker with this role is assigned to.
    ///
    /// `Head` maps to nothing because the head position comes from the HMD.
    #[must_use]
    pub fn body_part(self) -> BodyPart {
        match self {
            Self::None
            | Self::Head
            | Self::Camera
            | Self::Keyboard
            | Self::Beacon
            | Self::GenericController => BodyPart::None,
            Self::Hmd => BodyPart::Head,
            Self::Neck => BodyPart::Neck,
            Self::Chest => BodyPart::Chest,
            Self::Waist => BodyPart::Hip,
            Self::LeftKnee => BodyPart::LeftUpperLeg,
            Self::RightKnee => BodyPart::RightUpperLeg,
            Self::LeftFoot => BodyPart::LeftFoot,
            Self::RightFoot => BodyPart::RightFoot,
            Self::LeftController => BodyPart::LeftController,
            Self::RightController => BodyPart::RightController,
            Self::LeftElbow => BodyPart::LeftLowerArm,
            Self::RightElbow => BodyPart::RightLowerArm,
            Self::LeftShoulder => BodyPart::LeftUpperArm,
            Self::RightShoulder => BodyPart::RightUpperArm,
            Self::LeftHand => BodyPart::LeftHand,
            Self::RightHand => BodyPart::RightHand,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Rotation as a unit quaternion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// Scalar component.
    pub w: f32,
}

impl Quaternion {
    /// No rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Build from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    /// Build from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}
