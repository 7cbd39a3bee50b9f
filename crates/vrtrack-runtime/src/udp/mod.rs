//! UDP connection state machine.
//!
//! One [`UdpConnection`] exists per peer IP. It is an actor like every other
//! entity, plus two tasks bound to its cancellation token:
//!
//! - the packet pump, which takes decoded packets from a bounded inbox and
//!   handles them one at a time: sequence admission first, then the handler
//!   for the packet type;
//! - the heartbeat loop, which sends a heartbeat every interval once the
//!   connection is handshook.
//!
//! Packets are handled strictly in arrival order, so a handshake has created
//! its device before a later sensor-info packet from the same peer is looked
//! at.

mod admission;
mod device;
mod handshake;
mod heartbeat;
mod sensor;
mod state;

pub use admission::{Admission, admit};
pub use state::{
    CONNECTION_MODULES, ConnectionAction, ConnectionPhase, DiscoveryModule, HandshakeModule,
    PingModule, PingState, SequenceModule, UdpConnectionState,
};

use std::net::{IpAddr, SocketAddr};
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};
use vrtrack_core::Severity;
use vrtrack_core::constants::{HEARTBEAT_INTERVAL_MS, RECONNECT_IDLE_MS};
use vrtrack_protocol::{InboundPacket, OutboundPacket, Packet};

use crate::context::Context;
use crate::errors::{Result, RuntimeError};
use crate::registry::Registry;

/// Where outbound datagrams go.
///
/// Writes are fire-and-forget; implementations log failures themselves.
pub trait PacketSink: Send + Sync + 'static {
    /// Send one datagram.
    fn send_to(&self, datagram: Bytes, target: SocketAddr);
}

/// Tuning for a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Bound of the inbound packet queue. Packets beyond it are dropped.
    pub inbox_capacity: usize,
    /// Bound of the connection actor's action queue.
    pub action_capacity: usize,
    /// Silence after which a packet numbered 0 counts as a reconnect.
    pub reconnect_idle: Duration,
    /// Heartbeat period; `None` disables the heartbeat loop.
    pub heartbeat_interval: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            inbox_capacity: 256,
            action_capacity: 256,
            reconnect_idle: Duration::from_millis(RECONNECT_IDLE_MS),
            heartbeat_interval: Some(Duration::from_millis(HEARTBEAT_INTERVAL_MS)),
        }
    }
}

struct Inbound {
    packet: Packet,
    from: SocketAddr,
    received_at: Instant,
}

struct ConnectionInner {
    address: IpAddr,
    context: Context<UdpConnectionState, ConnectionAction>,
    inbox: mpsc::Sender<Inbound>,
    sink: Arc<dyn PacketSink>,
    outbound_number: AtomicI64,
}

/// Handle to one peer's connection actor.
#[derive(Clone)]
pub struct UdpConnection {
    inner: Arc<ConnectionInner>,
}

impl std::fmt::Debug for UdpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpConnection")
            .field("address", &self.inner.address)
            .field("context", &self.inner.context)
            .finish_non_exhaustive()
    }
}

impl UdpConnection {
    /// Start the actor and its tasks for a peer first seen at `peer`.
    ///
    /// Register the connection with [`Registry::add_connection`] before
    /// delivering its first packet.
    pub fn spawn(
        peer: SocketAddr,
        registry: Registry,
        sink: Arc<dyn PacketSink>,
        options: ConnectionOptions,
    ) -> Self {
        let context = Context::spawn(
            "udp_connection",
            UdpConnectionState::new(peer, Instant::now()),
            CONNECTION_MODULES,
            options.action_capacity,
        );
        let (inbox, packets) = mpsc::channel(options.inbox_capacity.max(1));
        let connection = Self {
            inner: Arc::new(ConnectionInner {
                address: peer.ip(),
                context,
                inbox,
                sink,
                outbound_number: AtomicI64::new(0),
            }),
        };

        drop(tokio::spawn(pump(
            connection.clone(),
            registry,
            packets,
            options.reconnect_idle,
        )));
        if let Some(interval) = options.heartbeat_interval {
            drop(tokio::spawn(heartbeat::run(
                connection.clone(),
                interval,
                connection.token().child_token(),
            )));
        }
        connection
    }

    /// Peer IP, the registry key.
    pub fn address(&self) -> IpAddr {
        self.inner.address
    }

    /// Queue a decoded packet for handling.
    ///
    /// Returns `false` when the packet was dropped because the inbox is full
    /// or the connection is destroyed.
    pub fn deliver(&self, packet: Packet, from: SocketAddr, received_at: Instant) -> bool {
        let inbound = Inbound {
            packet,
            from,
            received_at,
        };
        match self.inner.inbox.try_send(inbound) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(
                    address = %self.inner.address,
                    packet = dropped.packet.body.name(),
                    "connection inbox full, dropping packet"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Send a packet with the next outbound sequence number.
    pub fn send(&self, packet: OutboundPacket) {
        let number = self.inner.outbound_number.fetch_add(1, Ordering::Relaxed) + 1;
        self.send_numbered(packet, number);
    }

    /// Send a packet with an explicit sequence number.
    pub fn send_numbered(&self, packet: OutboundPacket, number: i64) {
        if self.is_destroyed() {
            return;
        }
        let target = self.state().peer;
        trace!(address = %target, packet = packet.name(), number, "sending packet");
        self.inner.sink.send_to(packet.encode(number), target);
    }

    /// Send one heartbeat now and record its send time.
    pub async fn send_heartbeat(&self) -> Result<()> {
        heartbeat::send_heartbeat(self).await
    }
}

impl Deref for UdpConnection {
    type Target = Context<UdpConnectionState, ConnectionAction>;

    fn deref(&self) -> &Self::Target {
        &self.inner.context
    }
}

async fn pump(
    connection: UdpConnection,
    registry: Registry,
    mut packets: mpsc::Receiver<Inbound>,
    reconnect_idle: Duration,
) {
    let cancel = connection.token();
    if connection.ready().await.is_err() {
        return;
    }

    loop {
        let inbound = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = packets.recv() => match next {
                Some(inbound) => inbound,
                None => break,
            },
        };
        let kind = inbound.packet.body.name();
        if let Err(err) = handle_packet(&connection, &registry, inbound, reconnect_idle).await {
            report(connection.address(), kind, &err);
        }
    }

    debug!(address = %connection.address(), "connection pump stopped");
}

fn report(address: IpAddr, packet: &'static str, err: &RuntimeError) {
    match err.severity() {
        Severity::Cancelled => {}
        severity if severity.is_escalated() => {
            error!(address = %address, packet, error = %err, "protocol invariant violated");
        }
        _ => warn!(address = %address, packet, error = %err, "packet dropped"),
    }
}

async fn handle_packet(
    connection: &UdpConnection,
    registry: &Registry,
    inbound: Inbound,
    reconnect_idle: Duration,
) -> Result<()> {
    let Inbound {
        packet,
        from,
        received_at,
    } = inbound;

    match admit(&connection.state(), packet.number, received_at, reconnect_idle) {
        Admission::Accept => {}
        Admission::Reconnect => {
            info!(address = %connection.address(), "Reconnecting");
            connection.dispatch(ConnectionAction::ResetSequence).await?;
        }
        Admission::Reject { last } => {
            warn!(
                address = %connection.address(),
                number = packet.number,
                last,
                packet = packet.body.name(),
                "out-of-order packet dropped"
            );
            return Ok(());
        }
    }

    let state = connection
        .dispatch_applied(ConnectionAction::Accept {
            number: packet.number,
            at: received_at,
            from,
        })
        .await?;

    match packet.body {
        InboundPacket::Heartbeat => {
            trace!(address = %connection.address(), "heartbeat");
            Ok(())
        }
        InboundPacket::Handshake(hello) => {
            handshake::on_handshake(connection, registry, &state, &hello).await
        }
        InboundPacket::PingPong { ping_id } => {
            heartbeat::on_pong(connection, registry, ping_id, received_at).await
        }
        InboundPacket::BatteryLevel { voltage, level } => {
            device::on_battery(connection, registry, &state, level, voltage).await
        }
        InboundPacket::SignalStrength { signal, .. } => {
            device::on_signal_strength(connection, registry, &state, signal).await
        }
        InboundPacket::SensorInfo {
            sensor_id,
            status,
            imu_type,
        } => sensor::on_sensor_info(connection, registry, sensor_id, status, imu_type).await,
        InboundPacket::Rotation {
            sensor_id,
            data_type,
            rotation,
            ..
        } => sensor::on_rotation(connection, registry, &state, sensor_id, data_type, rotation).await,
        InboundPacket::UserAction(action) => {
            info!(address = %connection.address(), action = ?action, "user action");
            Ok(())
        }
    }
}
