//! Heartbeat loop and round-trip measurement.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vrtrack_protocol::OutboundPacket;

use super::UdpConnection;
use super::state::ConnectionAction;
use crate::device::DeviceAction;
use crate::errors::Result;
use crate::registry::Registry;

/// Send a heartbeat every `interval` while handshook, until `cancel` fires.
pub(super) async fn run(connection: UdpConnection, interval: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if !connection.state().is_handshook() {
                    continue;
                }
                if let Err(err) = send_heartbeat(&connection).await {
                    if err.is_cancelled() {
                        break;
                    }
                    warn!(address = %connection.address(), error = %err, "heartbeat failed");
                }
            }
        }
    }
    debug!(address = %connection.address(), "heartbeat stopped");
}

pub(super) async fn send_heartbeat(connection: &UdpConnection) -> Result<()> {
    let state = connection
        .dispatch_applied(ConnectionAction::StartPing { at: Instant::now() })
        .await?;
    let ping_id = state.ping.id.wrapping_add(1);
    connection.send(OutboundPacket::Heartbeat { ping_id });
    Ok(())
}

pub(super) async fn on_pong(
    connection: &UdpConnection,
    registry: &Registry,
    ping_id: i32,
    received_at: Instant,
) -> Result<()> {
    let state = connection.state();
    let expected = state.ping.id.wrapping_add(1);
    if ping_id != expected {
        warn!(address = %connection.address(), ping_id, expected, "Ping ID does not match, ignoring");
        return Ok(());
    }
    let Some(started_at) = state.ping.started_at else {
        warn!(address = %connection.address(), ping_id, "pong without outstanding heartbeat, ignoring");
        return Ok(());
    };

    let rtt = received_at.saturating_duration_since(started_at);
    connection
        .dispatch(ConnectionAction::ReceivedPong { id: ping_id, rtt })
        .await?;
    debug!(address = %connection.address(), ping_id, rtt_ms = rtt.as_millis(), "pong");

    match state.device.and_then(|handle| registry.device(handle)) {
        Some(device) => device.dispatch(DeviceAction::UpdatePing(rtt)).await,
        None => Ok(()),
    }
}
