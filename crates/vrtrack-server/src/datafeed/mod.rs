//! Datafeed: periodic snapshots of the registry for subscribers.
//!
//! A subscriber describes what it wants with a [`DataMask`] and how often
//! with a [`DataFeedConfig`]. [`build_update`] turns one registry snapshot
//! into a [`DataFeedUpdate`] containing only the masked fields.

mod hub;
mod session;

pub use hub::FeedHub;
pub use session::FeedSession;

use std::time::Duration;

use serde::Serialize;
use vrtrack_core::{BodyPart, Handle, HardwareId, ImuType, Quaternion, TrackerStatus, Vector3};
use vrtrack_runtime::{DeviceState, RegistryState, TrackerState};

/// Which tracker fields to include.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackerDataMask {
    /// Name, body part, sensor kind, hardware id.
    pub info: bool,
    /// Connection status.
    pub status: bool,
    /// Orientation.
    pub rotation: bool,
    /// Position.
    pub position: bool,
}

/// Which parts of the registry to include.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DataMask {
    /// Device identity and hardware status.
    pub device_data: bool,
    /// Tracker fields; `None` leaves trackers out.
    pub tracker_data: Option<TrackerDataMask>,
}

/// One periodic subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataFeedConfig {
    /// Publish period.
    pub minimum_time_since_last: Duration,
    /// Fields to publish.
    pub data_mask: DataMask,
}

/// Battery, latency and radio readings of a device.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareStatus {
    /// Charge in percent.
    pub battery_pct: f32,
    /// Volts, when reported.
    pub battery_voltage: Option<f32>,
    /// Last heartbeat round trip in milliseconds.
    pub ping_ms: Option<u64>,
    /// Wi-Fi signal strength in dBm.
    pub rssi: Option<i8>,
}

/// Tracker identity fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerInfo {
    /// Custom or generated name.
    pub display_name: String,
    /// Durable configuration key.
    pub hardware_id: HardwareId,
    /// Assigned body part.
    pub body_part: BodyPart,
    /// Sensor chip.
    pub sensor_kind: Option<ImuType>,
    /// Drift compensation flag.
    pub allow_drift_compensation: bool,
}

/// Published tracker.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerData {
    /// Registry handle.
    pub id: Handle,
    /// Local sensor index on its device.
    pub sensor_index: u8,
    /// Identity, when masked in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<TrackerInfo>,
    /// Status, when masked in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TrackerStatus>,
    /// Orientation, when masked in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Quaternion>,
    /// Position, when masked in and known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vector3>,
}

/// Published device with its trackers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceData {
    /// Registry handle.
    pub id: Handle,
    /// Display name, when device data is masked in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hardware address, when device data is masked in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_address: Option<String>,
    /// Readings, when device data is masked in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_status: Option<HardwareStatus>,
    /// Trackers linked to this device, when tracker data is masked in.
    pub trackers: Vec<TrackerData>,
}

/// One published snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFeedUpdate {
    /// Devices in handle order.
    pub devices: Vec<DeviceData>,
}

/// Build an update from one registry snapshot.
pub fn build_update(registry: &RegistryState, mask: &DataMask) -> DataFeedUpdate {
    if !mask.device_data && mask.tracker_data.is_none() {
        return DataFeedUpdate::default();
    }

    let trackers: Vec<_> = registry.trackers.values().map(|t| t.state()).collect();
    let devices = registry
        .devices
        .values()
        .map(|device| {
            let state = device.state();
            let linked = match &mask.tracker_data {
                Some(tracker_mask) => trackers
                    .iter()
                    .filter(|t| t.device == Some(state.handle))
                    .map(|t| tracker_data(t, tracker_mask))
                    .collect(),
                None => Vec::new(),
            };
            device_data(&state, mask.device_data, linked)
        })
        .collect();

    DataFeedUpdate { devices }
}

fn device_data(state: &DeviceState, include: bool, trackers: Vec<TrackerData>) -> DeviceData {
    DeviceData {
        id: state.handle,
        name: include.then(|| state.name.clone()),
        hardware_address: include.then(|| state.hardware_address.clone()),
        hardware_status: include.then(|| HardwareStatus {
            battery_pct: state.battery.level * 100.0,
            battery_voltage: state.battery.voltage,
            ping_ms: state
                .ping
                .map(|rtt| u64::try_from(rtt.as_millis()).unwrap_or(u64::MAX)),
            rssi: state.signal_strength,
        }),
        trackers,
    }
}

fn tracker_data(state: &TrackerState, mask: &TrackerDataMask) -> TrackerData {
    TrackerData {
        id: state.handle,
        sensor_index: state.sensor_index,
        info: mask.info.then(|| TrackerInfo {
            display_name: state.display_name().to_owned(),
            hardware_id: state.hardware_id.clone(),
            body_part: state.body_part,
            sensor_kind: state.sensor_kind,
            allow_drift_compensation: state.allow_drift_compensation,
        }),
        status: mask.status.then_some(state.status),
        rotation: mask.rotation.then_some(state.rotation),
        position: if mask.position { state.position } else { None },
    }
}
