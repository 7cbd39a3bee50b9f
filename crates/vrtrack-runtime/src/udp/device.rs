//! Device-level reports forwarded to the handshake's device.

use tracing::warn;

use super::UdpConnection;
use super::state::UdpConnectionState;
use crate::device::{DeviceAction, DeviceContext};
use crate::errors::Result;
use crate::registry::Registry;

fn linked_device(
    connection: &UdpConnection,
    registry: &Registry,
    state: &UdpConnectionState,
    packet: &'static str,
) -> Option<DeviceContext> {
    let device = state.device.and_then(|handle| registry.device(handle));
    if device.is_none() {
        warn!(address = %connection.address(), packet, "no device linked, dropping packet");
    }
    device
}

pub(super) async fn on_battery(
    connection: &UdpConnection,
    registry: &Registry,
    state: &UdpConnectionState,
    level: f32,
    voltage: Option<f32>,
) -> Result<()> {
    match linked_device(connection, registry, state, "battery_level") {
        Some(device) => device.dispatch(DeviceAction::SetBattery { level, voltage }).await,
        None => Ok(()),
    }
}

pub(super) async fn on_signal_strength(
    connection: &UdpConnection,
    registry: &Registry,
    state: &UdpConnectionState,
    signal: i8,
) -> Result<()> {
    match linked_device(connection, registry, state, "signal_strength") {
        Some(device) => device.dispatch(DeviceAction::SetSignalStrength(signal)).await,
        None => Ok(()),
    }
}
