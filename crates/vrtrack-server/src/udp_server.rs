//! UDP socket loop.
//!
//! One socket serves every tracker. Each datagram is filtered by source
//! address, decoded, and delivered to the connection actor for its peer IP,
//! which is created and registered on first contact.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use vrtrack_protocol::decode;
use vrtrack_runtime::{PacketSink, Registry, UdpConnection};

use crate::config::UdpServerConfig;
use crate::errors::ServerError;

/// Sends datagrams through the shared server socket.
#[derive(Debug)]
pub struct SocketSink {
    socket: Arc<UdpSocket>,
}

impl PacketSink for SocketSink {
    fn send_to(&self, datagram: Bytes, target: SocketAddr) {
        if let Err(err) = self.socket.try_send_to(&datagram, target) {
            warn!(address = %target, error = %err, "UDP send failed");
        }
    }
}

/// The tracker-facing UDP server.
pub struct UdpTrackerServer {
    socket: Arc<UdpSocket>,
    sink: Arc<SocketSink>,
    registry: Registry,
    config: UdpServerConfig,
}

impl UdpTrackerServer {
    /// Bind the socket.
    pub async fn bind(config: UdpServerConfig, registry: Registry) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(config.bind)
            .await
            .map_err(|source| ServerError::Bind {
                address: config.bind,
                source,
            })?;
        let socket = Arc::new(socket);
        Ok(Self {
            sink: Arc::new(SocketSink {
                socket: Arc::clone(&socket),
            }),
            socket,
            registry,
            config,
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive and route datagrams until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut buf = vec![0_u8; self.config.max_datagram_size];
        if let Ok(address) = self.local_addr() {
            info!(address = %address, "UDP tracker server listening");
        }

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => self.route(&buf[..len], from).await,
                    Err(err) => warn!(error = %err, "UDP receive failed"),
                },
            }
        }
        info!("UDP tracker server stopped");
    }

    async fn route(&self, datagram: &[u8], from: SocketAddr) {
        let received_at = Instant::now();
        if !self.config.accepts(from.ip()) {
            trace!(address = %from, "datagram from filtered address");
            return;
        }

        let packet = match decode(datagram) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(address = %from, error = %err, "undecodable datagram dropped");
                return;
            }
        };
        trace!(address = %from, packet = packet.body.name(), number = packet.number, "datagram");

        let connection = match self.registry.connection(from.ip()) {
            Some(connection) => connection,
            None => match self.open_connection(from).await {
                Some(connection) => connection,
                None => return,
            },
        };
        let _ = connection.deliver(packet, from, received_at);
    }

    async fn open_connection(&self, from: SocketAddr) -> Option<UdpConnection> {
        let sink: Arc<dyn PacketSink> = self.sink.clone();
        let connection = UdpConnection::spawn(from, self.registry.clone(), sink, self.config.connection);
        match self.registry.add_connection(connection.clone()).await {
            Ok(()) => Some(connection),
            Err(err) => {
                connection.destroy();
                if !err.is_cancelled() {
                    warn!(address = %from, error = %err, "failed to register connection");
                }
                debug!(address = %from, "connection not opened");
                None
            }
        }
    }
}
