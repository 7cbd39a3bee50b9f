//! Shared fixtures for runtime integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::time::Instant;
use vrtrack_protocol::{Handshake, InboundPacket, OutboundPacket, Packet, decode};
use vrtrack_runtime::{
    ConfigContext, ConfigStore, ConnectionOptions, MemoryConfigStore, PacketSink, Registry,
    UdpConnection,
};

/// Sink that keeps every datagram.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(Bytes, SocketAddr)>>,
}

impl RecordingSink {
    /// Every datagram decoded back into `(type id, number, target)`.
    pub fn headers(&self) -> Vec<(u32, i64, SocketAddr)> {
        self.sent
            .lock()
            .iter()
            .map(|(bytes, target)| {
                let type_id = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                let number = i64::from_be_bytes(bytes[4..12].try_into().unwrap());
                (type_id, number, *target)
            })
            .collect()
    }

    /// Count of datagrams with the given type id.
    pub fn count(&self, packet: OutboundPacket) -> usize {
        self.headers()
            .iter()
            .filter(|(type_id, _, _)| *type_id == packet.type_id())
            .count()
    }

    /// Ping ids of every heartbeat sent.
    pub fn heartbeat_ids(&self) -> Vec<i32> {
        self.sent
            .lock()
            .iter()
            .filter_map(|(bytes, _)| match decode(bytes).ok()?.body {
                InboundPacket::PingPong { ping_id } => Some(ping_id),
                _ => None,
            })
            .collect()
    }
}

impl PacketSink for RecordingSink {
    fn send_to(&self, datagram: Bytes, target: SocketAddr) {
        self.sent.lock().push((datagram, target));
    }
}

pub const PEER: &str = "192.168.1.50:6969";
pub const MAC: [u8; 6] = [0x24, 0x0a, 0xc4, 0x11, 0x22, 0x33];
pub const MAC_STR: &str = "24:0a:c4:11:22:33";

pub fn peer() -> SocketAddr {
    PEER.parse().unwrap()
}

pub fn options() -> ConnectionOptions {
    ConnectionOptions {
        heartbeat_interval: None,
        ..ConnectionOptions::default()
    }
}

pub async fn registry_with(store: Arc<dyn ConfigStore>) -> Registry {
    let config = ConfigContext::load(store, Duration::from_millis(1000), 64)
        .await
        .unwrap();
    Registry::new(config, 64)
}

pub async fn registry() -> Registry {
    registry_with(Arc::new(MemoryConfigStore::default())).await
}

/// A registered connection plus a packet counter.
pub struct Peer {
    pub connection: UdpConnection,
    pub sink: Arc<RecordingSink>,
    pub from: SocketAddr,
    next: i64,
}

impl Peer {
    pub async fn connect(registry: &Registry, from: SocketAddr, options: ConnectionOptions) -> Self {
        let sink = Arc::new(RecordingSink::default());
        let connection = UdpConnection::spawn(from, registry.clone(), sink.clone(), options);
        registry.add_connection(connection.clone()).await.unwrap();
        Self {
            connection,
            sink,
            from,
            next: 1,
        }
    }

    /// Deliver with an explicit sequence number.
    pub fn send_numbered(&mut self, number: i64, body: InboundPacket) {
        self.next = number + 1;
        assert!(
            self.connection
                .deliver(Packet { number, body }, self.from, Instant::now())
        );
    }

    /// Deliver with the next sequence number.
    pub fn send(&mut self, body: InboundPacket) -> i64 {
        let number = self.next;
        self.send_numbered(number, body);
        number
    }

    /// Deliver and wait until the connection has handled the packet.
    pub async fn send_and_settle(&mut self, body: InboundPacket) {
        let number = self.send(body);
        self.settle(number).await;
    }

    /// Wait until packet `number` has been accepted, then let its handler finish
    /// by pushing a heartbeat through the pump behind it.
    pub async fn settle(&mut self, number: i64) {
        let _ = self
            .connection
            .wait_until(|s| s.last_packet_num >= number)
            .await
            .unwrap();
        let marker = self.send(InboundPacket::Heartbeat);
        let _ = self
            .connection
            .wait_until(|s| s.last_packet_num >= marker)
            .await
            .unwrap();
    }

    pub async fn handshake(&mut self, mac: [u8; 6]) {
        self.send_and_settle(InboundPacket::Handshake(handshake(mac)))
            .await;
        assert!(self.connection.state().is_handshook());
    }
}

/// Handshake from current firmware.
pub fn handshake(mac: [u8; 6]) -> Handshake {
    Handshake {
        board: Some(2),
        imu: Some(4),
        mcu: Some(2),
        imu_info: Some([0, 0, 0]),
        firmware_build: Some(17),
        firmware: Some("0.4.0".into()),
        mac: Some(mac),
    }
}

pub fn sensor_info(sensor_id: u8) -> InboundPacket {
    InboundPacket::SensorInfo {
        sensor_id,
        status: 1,
        imu_type: Some(5),
    }
}
