//! Root registry: the process-wide directory of live actors.
//!
//! The registry is itself a [`Context`]. Its state maps peer addresses to UDP
//! connections and handles to devices and trackers; every change goes through
//! its serialized queue, so readers always see a whole snapshot.
//!
//! Handles come from an atomic counter reserved before the actor is spawned,
//! so concurrent creations never share a handle. `last_handle` in the state
//! records the highest handle registered so far.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};
use vrtrack_core::{Handle, HardwareId, Origin};

use crate::config::ConfigContext;
use crate::context::Context;
use crate::device::{DeviceContext, DeviceState};
use crate::errors::Result;
use crate::tracker::{TrackerContext, TrackerState};
use crate::udp::UdpConnection;

/// Every live actor, by key.
#[derive(Clone, Debug, Default)]
pub struct RegistryState {
    /// UDP connections by peer IP.
    pub udp_connections: HashMap<IpAddr, UdpConnection>,
    /// Devices by handle.
    pub devices: BTreeMap<Handle, DeviceContext>,
    /// Trackers by handle.
    pub trackers: BTreeMap<Handle, TrackerContext>,
    /// Highest handle registered so far.
    pub last_handle: Option<Handle>,
}

impl RegistryState {
    fn note_handle(&mut self, handle: Handle) {
        self.last_handle = Some(self.last_handle.map_or(handle, |last| last.max(handle)));
    }
}

/// Registry actions.
#[derive(Clone, Debug)]
pub enum RegistryAction {
    /// Register a connection under its peer IP.
    NewUdpConnection(UdpConnection),
    /// Forget the connection for a peer IP.
    RemoveUdpConnection(IpAddr),
    /// Register a device.
    NewDevice(DeviceContext),
    /// Register a tracker.
    NewTracker(TrackerContext),
    /// Forget a device.
    RemoveDevice(Handle),
    /// Forget a tracker.
    RemoveTracker(Handle),
}

fn reduce(state: &RegistryState, action: &RegistryAction) -> RegistryState {
    let mut next = state.clone();
    match action {
        RegistryAction::NewUdpConnection(connection) => {
            let _ = next
                .udp_connections
                .insert(connection.address(), connection.clone());
        }
        RegistryAction::RemoveUdpConnection(address) => {
            let _ = next.udp_connections.remove(address);
        }
        RegistryAction::NewDevice(device) => {
            let _ = next.devices.insert(device.handle(), device.clone());
            next.note_handle(device.handle());
        }
        RegistryAction::NewTracker(tracker) => {
            let _ = next.trackers.insert(tracker.handle(), tracker.clone());
            next.note_handle(tracker.handle());
        }
        RegistryAction::RemoveDevice(handle) => {
            let _ = next.devices.remove(handle);
        }
        RegistryAction::RemoveTracker(handle) => {
            let _ = next.trackers.remove(handle);
        }
    }
    next
}

/// A tracker as referenced by an external message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackerRef {
    /// Owning device, when the message names one.
    pub device: Option<Handle>,
    /// Tracker handle.
    pub tracker: Handle,
}

/// Handle to the registry actor plus the shared configuration.
#[derive(Clone, Debug)]
pub struct Registry {
    context: Context<RegistryState, RegistryAction>,
    config: ConfigContext,
    handles: Arc<AtomicU64>,
    capacity: usize,
}

impl Registry {
    /// Start an empty registry.
    ///
    /// `capacity` bounds the action queue of the registry and of every
    /// device and tracker it creates.
    pub fn new(config: ConfigContext, capacity: usize) -> Self {
        Self {
            context: Context::spawn("registry", RegistryState::default(), reduce, capacity),
            config,
            handles: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Reserve the next handle. Handles start at 1 and are never reused.
    pub fn next_handle(&self) -> Handle {
        Handle::new(self.handles.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// The configuration actor.
    pub fn config(&self) -> &ConfigContext {
        &self.config
    }

    /// Create a device, wait for its first broadcast, and register it.
    pub async fn create_device(
        &self,
        hardware_address: impl Into<String>,
        origin: Origin,
    ) -> Result<DeviceContext> {
        let handle = self.next_handle();
        let device = DeviceContext::spawn(DeviceState::new(handle, hardware_address, origin), self.capacity);
        let initial = device.ready().await?;
        if let Err(err) = self
            .context
            .dispatch_applied(RegistryAction::NewDevice(device.clone()))
            .await
        {
            device.destroy();
            return Err(err);
        }
        info!(
            handle = %handle,
            address = %initial.hardware_address,
            origin = %origin,
            "device created"
        );
        Ok(device)
    }

    /// Create a tracker seeded from its stored configuration and register it.
    pub async fn create_tracker(
        &self,
        hardware_id: HardwareId,
        sensor_index: u8,
        origin: Origin,
    ) -> Result<TrackerContext> {
        let handle = self.next_handle();
        let stored = self.config.tracker(&hardware_id);
        let tracker = TrackerContext::spawn(
            TrackerState::new(handle, sensor_index, hardware_id, origin, stored.as_ref()),
            self.capacity,
        );
        let initial = tracker.ready().await?;
        if let Err(err) = self
            .context
            .dispatch_applied(RegistryAction::NewTracker(tracker.clone()))
            .await
        {
            tracker.destroy();
            return Err(err);
        }
        info!(
            handle = %handle,
            hardware_id = %initial.hardware_id,
            body_part = ?initial.body_part,
            origin = %origin,
            "tracker created"
        );
        Ok(tracker)
    }

    /// Device by handle.
    pub fn device(&self, handle: Handle) -> Option<DeviceContext> {
        self.state().devices.get(&handle).cloned()
    }

    /// Tracker by handle.
    pub fn tracker(&self, handle: Handle) -> Option<TrackerContext> {
        self.state().trackers.get(&handle).cloned()
    }

    /// Resolve an external tracker reference.
    ///
    /// `None` when the named device or tracker is unknown, or when the tracker
    /// is linked to a different device.
    pub fn lookup_tracker(&self, reference: TrackerRef) -> Option<TrackerContext> {
        let state = self.state();
        if reference
            .device
            .is_some_and(|device| !state.devices.contains_key(&device))
        {
            return None;
        }
        let tracker = state.trackers.get(&reference.tracker)?;
        match (reference.device, tracker.state().device) {
            (Some(wanted), Some(linked)) if wanted != linked => None,
            _ => Some(tracker.clone()),
        }
    }

    /// Connection for a peer IP.
    pub fn connection(&self, address: IpAddr) -> Option<UdpConnection> {
        self.state().udp_connections.get(&address).cloned()
    }

    /// Register a connection and wait until it is visible to lookups.
    pub async fn add_connection(&self, connection: UdpConnection) -> Result<()> {
        let address = connection.address();
        let _ = self
            .context
            .dispatch_applied(RegistryAction::NewUdpConnection(connection))
            .await?;
        info!(address = %address, "new UDP connection");
        Ok(())
    }

    /// Forget a connection and destroy its actor.
    pub async fn remove_connection(&self, address: IpAddr) -> Result<()> {
        let existing = self.connection(address);
        let _ = self
            .context
            .dispatch_applied(RegistryAction::RemoveUdpConnection(address))
            .await?;
        if let Some(connection) = existing {
            connection.destroy();
            debug!(address = %address, "UDP connection removed");
        }
        Ok(())
    }

    /// Forget a device and destroy its actor.
    pub async fn remove_device(&self, handle: Handle) -> Result<()> {
        let existing = self.device(handle);
        let _ = self
            .context
            .dispatch_applied(RegistryAction::RemoveDevice(handle))
            .await?;
        if let Some(device) = existing {
            device.destroy();
            debug!(handle = %handle, "device removed");
        }
        Ok(())
    }

    /// Forget a tracker and destroy its actor.
    pub async fn remove_tracker(&self, handle: Handle) -> Result<()> {
        let existing = self.tracker(handle);
        let _ = self
            .context
            .dispatch_applied(RegistryAction::RemoveTracker(handle))
            .await?;
        if let Some(tracker) = existing {
            tracker.destroy();
            debug!(handle = %handle, "tracker removed");
        }
        Ok(())
    }

    /// Destroy every registered actor, then the registry, then flush config.
    pub async fn shutdown(&self) {
        let state = self.state();
        for connection in state.udp_connections.values() {
            connection.destroy();
        }
        for tracker in state.trackers.values() {
            tracker.destroy();
        }
        for device in state.devices.values() {
            device.destroy();
        }
        self.context.destroy();
        self.config.shutdown().await;
        info!(
            connections = state.udp_connections.len(),
            devices = state.devices.len(),
            trackers = state.trackers.len(),
            "registry shut down"
        );
    }
}

impl Deref for Registry {
    type Target = Context<RegistryState, RegistryAction>;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigStore;
    use crate::tracker::TrackerAction;
    use assert_matches::assert_matches;
    use std::time::Duration;

    async fn registry() -> Registry {
        let config = ConfigContext::load(
            Arc::new(MemoryConfigStore::default()),
            Duration::from_millis(1000),
            16,
        )
        .await
        .unwrap();
        Registry::new(config, 16)
    }

    #[tokio::test]
    async fn handles_start_at_one() {
        let registry = registry().await;
        assert_eq!(registry.next_handle(), Handle::new(1));
        assert_eq!(registry.next_handle(), Handle::new(2));
    }

    #[tokio::test]
    async fn created_entities_are_registered() {
        let registry = registry().await;
        let device = registry.create_device("aa:bb", Origin::Udp).await.unwrap();
        let tracker = registry
            .create_tracker(HardwareId::derive("aa:bb", 0), 0, Origin::Udp)
            .await
            .unwrap();

        assert!(registry.device(device.handle()).is_some());
        assert!(registry.tracker(tracker.handle()).is_some());
        assert_eq!(registry.state().last_handle, Some(tracker.handle()));
        assert!(tracker.handle() > device.handle());
    }

    #[tokio::test]
    async fn lookup_tracker_checks_device() {
        let registry = registry().await;
        let device = registry.create_device("aa:bb", Origin::Udp).await.unwrap();
        let tracker = registry
            .create_tracker(HardwareId::derive("aa:bb", 0), 0, Origin::Udp)
            .await
            .unwrap();
        let _ = tracker
            .dispatch_applied(TrackerAction::LinkDevice(device.handle()))
            .await
            .unwrap();

        let found = registry.lookup_tracker(TrackerRef {
            device: Some(device.handle()),
            tracker: tracker.handle(),
        });
        assert!(found.is_some_and(|t| t.same_actor(&tracker)));

        assert!(
            registry
                .lookup_tracker(TrackerRef {
                    device: None,
                    tracker: tracker.handle(),
                })
                .is_some()
        );
        assert!(
            registry
                .lookup_tracker(TrackerRef {
                    device: Some(Handle::new(99)),
                    tracker: tracker.handle(),
                })
                .is_none()
        );
        assert!(
            registry
                .lookup_tracker(TrackerRef {
                    device: Some(device.handle()),
                    tracker: Handle::new(99),
                })
                .is_none()
        );
    }

    #[tokio::test]
    async fn removal_destroys_actor() {
        let registry = registry().await;
        let device = registry.create_device("aa:bb", Origin::Udp).await.unwrap();
        registry.remove_device(device.handle()).await.unwrap();

        assert!(registry.device(device.handle()).is_none());
        assert!(device.is_destroyed());
        // Removing twice is harmless.
        registry.remove_device(device.handle()).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_destroys_everything() {
        let registry = registry().await;
        let device = registry.create_device("aa:bb", Origin::Udp).await.unwrap();
        registry.shutdown().await;

        assert!(device.is_destroyed());
        assert!(registry.is_destroyed());
        assert!(registry.config().is_destroyed());
        assert_matches!(
            registry.create_device("cc:dd", Origin::Udp).await,
            Err(crate::errors::RuntimeError::Cancelled)
        );
    }
}
