//! Sensor discovery and per-sensor forwarding.

use tracing::{debug, info, warn};
use vrtrack_core::{HardwareId, ImuType, Origin, Quaternion, TrackerStatus};
use vrtrack_protocol::{OutboundPacket, RotationDataType};

use super::UdpConnection;
use super::state::{ConnectionAction, UdpConnectionState};
use crate::errors::{Result, RuntimeError};
use crate::registry::Registry;
use crate::tracker::{TrackerAction, TrackerContext};

pub(super) async fn on_sensor_info(
    connection: &UdpConnection,
    registry: &Registry,
    sensor_id: u8,
    status: u8,
    imu_type: Option<u8>,
) -> Result<()> {
    let info = TrackerAction::SetInfo {
        status: Some(TrackerStatus::from_sensor_status(status)),
        sensor_kind: imu_type.map(ImuType::from),
    };
    let known = connection.state().trackers.get(&sensor_id).copied();
    match known {
        Some(handle) => match registry.tracker(handle) {
            Some(tracker) => tracker.dispatch(info).await?,
            None => {
                warn!(
                    address = %connection.address(),
                    sensor_id,
                    tracker = %handle,
                    "sensor maps to a tracker that is no longer registered"
                );
                return Ok(());
            }
        },
        None => discover(connection, registry, sensor_id, info).await?,
    }

    // Only acknowledge once a tracker stands behind the sensor.
    connection.send(OutboundPacket::SensorInfoAck { sensor_id, status });
    Ok(())
}

/// Create the tracker for a newly seen sensor and link it to the device.
pub(super) async fn discover(
    connection: &UdpConnection,
    registry: &Registry,
    sensor_id: u8,
    info: TrackerAction,
) -> Result<()> {
    let state = connection.state();
    if state.trackers.contains_key(&sensor_id) {
        return Ok(());
    }
    let Some(device_handle) = state.device else {
        return Err(RuntimeError::ProtocolViolation {
            address: state.peer,
            reason: "sensor info before handshake",
        });
    };
    let device = registry
        .device(device_handle)
        .ok_or(RuntimeError::UnknownDevice(device_handle))?;

    let hardware_id = HardwareId::derive(&device.state().hardware_address, sensor_id);
    let tracker = registry
        .create_tracker(hardware_id, sensor_id, Origin::Udp)
        .await?;
    let _ = connection
        .dispatch_applied(ConnectionAction::AssignTracker {
            sensor_id,
            handle: tracker.handle(),
        })
        .await?;
    tracker.dispatch(info).await?;
    tracker
        .dispatch(TrackerAction::LinkDevice(device_handle))
        .await?;

    info!(
        address = %connection.address(),
        sensor_id,
        tracker = %tracker.handle(),
        device = %device_handle,
        "sensor discovered"
    );
    Ok(())
}

fn tracker_for(
    connection: &UdpConnection,
    registry: &Registry,
    state: &UdpConnectionState,
    sensor_id: u8,
) -> Option<TrackerContext> {
    let tracker = state
        .trackers
        .get(&sensor_id)
        .and_then(|handle| registry.tracker(*handle));
    if tracker.is_none() {
        warn!(address = %connection.address(), sensor_id, "packet for unknown sensor dropped");
    }
    tracker
}

pub(super) async fn on_rotation(
    connection: &UdpConnection,
    registry: &Registry,
    state: &UdpConnectionState,
    sensor_id: u8,
    data_type: RotationDataType,
    rotation: Quaternion,
) -> Result<()> {
    match data_type {
        RotationDataType::Normal => {}
        RotationDataType::Correction | RotationDataType::Other(_) => {
            debug!(address = %connection.address(), sensor_id, data_type = ?data_type, "rotation data ignored");
            return Ok(());
        }
    }
    match tracker_for(connection, registry, state, sensor_id) {
        Some(tracker) => tracker.dispatch(TrackerAction::SetRotation(rotation)).await,
        None => Ok(()),
    }
}
