//! Identifier newtypes.
//!
//! [`Handle`] is the registry-issued numeric identity of a live device or
//! tracker. [`HardwareId`] is the durable string key under which per-tracker
//! configuration is persisted; it is derived from the owning device's hardware
//! address and the sensor's local index, so it survives reconnects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry-issued identifier for a device or tracker.
///
/// Devices and trackers draw from one shared counter, so a handle value is
/// never reused across entity kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u64);

impl Handle {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Return the raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Durable per-sensor key used by the configuration store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareId(String);

impl HardwareId {
    /// Derive the hardware id of sensor `sensor_index` on the device with the
    /// given hardware address.
    #[must_use]
    pub fn derive(device_address: &str, sensor_index: u8) -> Self {
        Self(format!("{device_address}/{sensor_index}"))
    }

    /// Create from an existing string value.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HardwareId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HardwareId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn handle_ordering_follows_value() {
        assert!(Handle::new(1) < Handle::new(2));
        assert_eq!(Handle::from(7).get(), 7);
    }

    #[test]
    fn handle_serializes_as_number() {
        let json = serde_json::to_string(&Handle::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn hardware_id_format() {
        let id = HardwareId::derive("aa:bb:cc:dd:ee:ff", 2);
        assert_eq!(id.as_str(), "aa:bb:cc:dd:ee:ff/2");
    }

    #[test]
    fn hardware_id_serde_transparent() {
        let id = HardwareId::from("dev/0");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"dev/0\"");
        let back: HardwareId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    proptest! {
        #[test]
        fn hardware_id_is_stable(addr in "[0-9a-f:]{1,17}", index in any::<u8>()) {
            prop_assert_eq!(HardwareId::derive(&addr, index), HardwareId::derive(&addr, index));
        }

        #[test]
        fn hardware_id_distinguishes_sensors(addr in "[0-9a-f:]{1,17}", a in any::<u8>(), b in any::<u8>()) {
            prop_assume!(a != b);
            prop_assert_ne!(HardwareId::derive(&addr, a), HardwareId::derive(&addr, b));
        }
    }
}
