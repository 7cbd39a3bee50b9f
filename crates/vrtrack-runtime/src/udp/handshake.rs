//! Handshake handling: device creation and acknowledgment.

use std::net::SocketAddr;

use tracing::{debug, info};
use vrtrack_core::constants::NULL_MAC;
use vrtrack_core::{ImuType, Origin, TrackerStatus};
use vrtrack_protocol::{Handshake, OutboundPacket};

use super::state::{ConnectionAction, UdpConnectionState};
use super::{UdpConnection, sensor};
use crate::errors::Result;
use crate::registry::Registry;
use crate::tracker::TrackerAction;

/// Device hardware address for a handshake: the reported MAC, or the peer's
/// `ip:port` when the firmware sends the null MAC.
pub(super) fn hardware_address(hello: &Handshake, peer: SocketAddr) -> String {
    let mac = hello.mac_string();
    if mac == NULL_MAC { peer.to_string() } else { mac }
}

pub(super) async fn on_handshake(
    connection: &UdpConnection,
    registry: &Registry,
    state: &UdpConnectionState,
    hello: &Handshake,
) -> Result<()> {
    if state.device.is_some() {
        debug!(address = %connection.address(), "repeated handshake");
        connection.send_numbered(OutboundPacket::HandshakeAck, 0);
        return Ok(());
    }

    connection.dispatch(ConnectionAction::HandshakePending).await?;
    let address = hardware_address(hello, state.peer);
    let device = match registry.create_device(address.as_str(), Origin::Udp).await {
        Ok(device) => device,
        Err(err) => {
            let _ = connection.dispatch(ConnectionAction::HandshakeFailed).await;
            return Err(err);
        }
    };
    let _ = connection
        .dispatch_applied(ConnectionAction::Handshook {
            device: device.handle(),
        })
        .await?;
    connection.send_numbered(OutboundPacket::HandshakeAck, 0);
    info!(
        address = %connection.address(),
        hardware_address = %address,
        device = %device.handle(),
        firmware = hello.firmware.as_deref().unwrap_or("unknown"),
        board = ?hello.board,
        "handshake complete"
    );

    if hello.is_legacy() {
        // Old firmware never sends sensor info; its single sensor is implied.
        let imu = hello
            .imu
            .and_then(|raw| u8::try_from(raw).ok())
            .map(ImuType::from);
        sensor::discover(
            connection,
            registry,
            0,
            TrackerAction::SetInfo {
                status: Some(TrackerStatus::Ok),
                sensor_kind: imu,
            },
        )
        .await?;
    }
    Ok(())
}
