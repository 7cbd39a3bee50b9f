//! # vrtrack-server
//!
//! Everything between the sockets and the runtime actors:
//!
//! - [`udp_server`]: the UDP socket loop that decodes datagrams and routes
//!   them to per-peer connection actors.
//! - [`datafeed`]: periodic, mask-filtered snapshots of the registry for
//!   subscribers.
//! - [`control`]: control-channel requests such as tracker reassignment.
//! - [`local_transport`]: platform check for the driver/feeder pipes.
//! - [`shutdown`]: graceful shutdown coordination.

pub mod config;
pub mod control;
pub mod datafeed;
pub mod errors;
pub mod local_transport;
pub mod shutdown;
pub mod udp_server;

pub use config::UdpServerConfig;
pub use errors::ServerError;
pub use shutdown::ShutdownCoordinator;
pub use udp_server::UdpTrackerServer;
