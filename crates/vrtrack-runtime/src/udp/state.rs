//! Connection state and its reducer modules.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::Instant;
use vrtrack_core::Handle;

use crate::context::{ModuleChain, ReducerModule};

/// Handshake progress of a connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Address seen, no handshake yet.
    #[default]
    Unknown,
    /// Handshake received, device being created.
    HandshakePending,
    /// Device linked; heartbeats run.
    Handshook,
}

/// Heartbeat bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PingState {
    /// Id of the last answered ping. The next heartbeat carries `id + 1`.
    pub id: i32,
    /// When the outstanding heartbeat was sent.
    pub started_at: Option<Instant>,
    /// Last measured round trip.
    pub rtt: Option<Duration>,
}

/// State of one UDP peer.
#[derive(Clone, Debug, PartialEq)]
pub struct UdpConnectionState {
    /// Where the last accepted packet came from; replies go here.
    pub peer: SocketAddr,
    /// When the last packet was accepted.
    pub last_packet: Instant,
    /// Sequence number of the last accepted packet, `-1` before any.
    pub last_packet_num: i64,
    /// Handshake progress.
    pub phase: ConnectionPhase,
    /// Heartbeat bookkeeping.
    pub ping: PingState,
    /// Discovered trackers by local sensor index.
    pub trackers: BTreeMap<u8, Handle>,
    /// Device created by the handshake.
    pub device: Option<Handle>,
}

impl UdpConnectionState {
    /// Fresh state for a newly seen peer.
    pub fn new(peer: SocketAddr, now: Instant) -> Self {
        Self {
            peer,
            last_packet: now,
            last_packet_num: -1,
            phase: ConnectionPhase::Unknown,
            ping: PingState::default(),
            trackers: BTreeMap::new(),
            device: None,
        }
    }

    /// Whether the handshake has completed.
    pub fn is_handshook(&self) -> bool {
        self.phase == ConnectionPhase::Handshook
    }
}

/// Connection actions.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionAction {
    /// A packet passed admission.
    Accept {
        /// Its sequence number.
        number: i64,
        /// When it arrived.
        at: Instant,
        /// Sender address and port.
        from: SocketAddr,
    },
    /// The peer restarted; accept sequence number 0 again.
    ResetSequence,
    /// A handshake is being processed.
    HandshakePending,
    /// Device creation for a pending handshake failed.
    HandshakeFailed,
    /// The handshake's device is registered.
    Handshook {
        /// Device handle.
        device: Handle,
    },
    /// A sensor index now maps to a tracker.
    AssignTracker {
        /// Local sensor index.
        sensor_id: u8,
        /// Tracker handle.
        handle: Handle,
    },
    /// A heartbeat was sent.
    StartPing {
        /// Send time.
        at: Instant,
    },
    /// A matching pong arrived.
    ReceivedPong {
        /// The answered ping id.
        id: i32,
        /// Measured round trip.
        rtt: Duration,
    },
}

/// Sequence number and peer address bookkeeping.
pub struct SequenceModule;

impl ReducerModule<UdpConnectionState, ConnectionAction> for SequenceModule {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn reduce(&self, state: UdpConnectionState, action: &ConnectionAction) -> UdpConnectionState {
        match *action {
            ConnectionAction::Accept { number, at, from } => UdpConnectionState {
                peer: from,
                last_packet: at,
                last_packet_num: number,
                ..state
            },
            ConnectionAction::ResetSequence => UdpConnectionState {
                last_packet_num: -1,
                ..state
            },
            _ => state,
        }
    }
}

/// Handshake phase transitions.
pub struct HandshakeModule;

impl ReducerModule<UdpConnectionState, ConnectionAction> for HandshakeModule {
    fn name(&self) -> &'static str {
        "handshake"
    }

    fn reduce(&self, state: UdpConnectionState, action: &ConnectionAction) -> UdpConnectionState {
        match *action {
            ConnectionAction::HandshakePending => UdpConnectionState {
                phase: ConnectionPhase::HandshakePending,
                ..state
            },
            ConnectionAction::HandshakeFailed if state.device.is_none() => UdpConnectionState {
                phase: ConnectionPhase::Unknown,
                ..state
            },
            ConnectionAction::Handshook { device } => UdpConnectionState {
                phase: ConnectionPhase::Handshook,
                device: Some(device),
                ..state
            },
            _ => state,
        }
    }
}

/// Sensor index to tracker mapping.
pub struct DiscoveryModule;

impl ReducerModule<UdpConnectionState, ConnectionAction> for DiscoveryModule {
    fn name(&self) -> &'static str {
        "discovery"
    }

    fn reduce(&self, mut state: UdpConnectionState, action: &ConnectionAction) -> UdpConnectionState {
        if let ConnectionAction::AssignTracker { sensor_id, handle } = *action {
            let _ = state.trackers.entry(sensor_id).or_insert(handle);
        }
        state
    }
}

/// Heartbeat send time and round trip.
pub struct PingModule;

impl ReducerModule<UdpConnectionState, ConnectionAction> for PingModule {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn reduce(&self, state: UdpConnectionState, action: &ConnectionAction) -> UdpConnectionState {
        match *action {
            ConnectionAction::StartPing { at } => UdpConnectionState {
                ping: PingState {
                    started_at: Some(at),
                    ..state.ping
                },
                ..state
            },
            ConnectionAction::ReceivedPong { id, rtt } => UdpConnectionState {
                ping: PingState {
                    id,
                    started_at: None,
                    rtt: Some(rtt),
                },
                ..state
            },
            _ => state,
        }
    }
}

/// Ordered reducer modules of a UDP connection.
pub const CONNECTION_MODULES: ModuleChain<UdpConnectionState, ConnectionAction> = ModuleChain::new(&[
    &SequenceModule,
    &HandshakeModule,
    &DiscoveryModule,
    &PingModule,
]);
