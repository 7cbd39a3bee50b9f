//! # vrtrack-runtime
//!
//! Actors and the state machines built on them.
//!
//! - [`context`]: the actor primitive ([`Context`]) and reducer module chains.
//! - [`device`], [`tracker`], [`config`]: entity actors.
//! - [`registry`]: the root directory of live actors and handle issuance.
//! - [`udp`]: one connection actor per tracker peer.
//! - [`feeder`]: dispatch of decoded driver/feeder messages.

pub mod config;
pub mod context;
pub mod device;
pub mod errors;
pub mod feeder;
pub mod registry;
pub mod tracker;
pub mod udp;

pub use config::{
    ConfigAction, ConfigContext, ConfigState, ConfigStore, FileConfigStore, MemoryConfigStore,
    TrackerConfig,
};
pub use context::{Context, ModuleChain, Reducer, ReducerModule, Snapshot};
pub use device::{DeviceAction, DeviceContext, DeviceState};
pub use errors::{Result, RuntimeError, StoreError};
pub use feeder::{FeederMessage, FeederSession};
pub use registry::{Registry, RegistryAction, RegistryState, TrackerRef};
pub use tracker::{TrackerAction, TrackerContext, TrackerSettings, TrackerState};
pub use udp::{ConnectionOptions, ConnectionPhase, PacketSink, UdpConnection, UdpConnectionState};
