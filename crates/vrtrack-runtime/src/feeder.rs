//! Driver and feeder input dispatch.
//!
//! The local driver and feeder processes describe trackers with their own
//! numeric ids. A [`FeederSession`] maps those ids onto registry handles,
//! creating one device and one tracker per announced tracker, and forwards
//! status and pose updates. Closing the session removes what it created.

use std::collections::HashMap;

use tracing::{info, warn};
use vrtrack_core::{Handle, HardwareId, Origin, Quaternion, TrackerRole, TrackerStatus, Vector3};

use crate::errors::{Result, RuntimeError};
use crate::registry::Registry;
use crate::tracker::{TrackerAction, TrackerSettings};

/// Decoded message from a driver or feeder pipe.
#[derive(Clone, Debug, PartialEq)]
pub enum FeederMessage {
    /// A new tracker is available.
    TrackerAdded {
        /// Sender-side tracker id.
        tracker_id: u32,
        /// Serial number, unique per sender.
        serial: String,
        /// Raw tracker role.
        role: u32,
    },
    /// Tracker status change.
    TrackerStatus {
        /// Sender-side tracker id.
        tracker_id: u32,
        /// Raw status, `0` is disconnected.
        status: u32,
    },
    /// Pose update.
    Position {
        /// Sender-side tracker id.
        tracker_id: u32,
        /// Position.
        position: Vector3,
        /// Orientation.
        rotation: Quaternion,
    },
    /// Button or menu action.
    UserAction {
        /// Action name.
        name: String,
    },
}

#[derive(Clone, Copy, Debug)]
struct Mapped {
    device: Handle,
    tracker: Handle,
}

/// Dispatch state for one driver or feeder connection.
#[derive(Debug)]
pub struct FeederSession {
    origin: Origin,
    registry: Registry,
    trackers: HashMap<u32, Mapped>,
}

impl FeederSession {
    /// New session for messages arriving with `origin`.
    pub fn new(origin: Origin, registry: Registry) -> Self {
        Self {
            origin,
            registry,
            trackers: HashMap::new(),
        }
    }

    /// Registry handle of a sender-side tracker id.
    pub fn tracker_handle(&self, tracker_id: u32) -> Option<Handle> {
        self.trackers.get(&tracker_id).map(|m| m.tracker)
    }

    /// Apply one message.
    pub async fn handle(&mut self, message: FeederMessage) -> Result<()> {
        match message {
            FeederMessage::TrackerAdded {
                tracker_id,
                serial,
                role,
            } => self.add_tracker(tracker_id, &serial, role).await,
            FeederMessage::TrackerStatus { tracker_id, status } => {
                let action = TrackerAction::SetInfo {
                    status: Some(TrackerStatus::from_feeder(status)),
                    sensor_kind: None,
                };
                self.forward(tracker_id, action).await
            }
            FeederMessage::Position {
                tracker_id,
                position,
                rotation,
            } => {
                self.forward(tracker_id, TrackerAction::SetPosition(position))
                    .await?;
                self.forward(tracker_id, TrackerAction::SetRotation(rotation))
                    .await
            }
            FeederMessage::UserAction { name } => {
                info!(origin = %self.origin, action = %name, "user action");
                Ok(())
            }
        }
    }

    async fn add_tracker(&mut self, tracker_id: u32, serial: &str, role: u32) -> Result<()> {
        if self.trackers.contains_key(&tracker_id) {
            warn!(origin = %self.origin, tracker_id, "tracker announced twice, ignoring");
            return Ok(());
        }
        let address = format!("{}://{serial}", self.origin);
        let device = self.registry.create_device(address.as_str(), self.origin).await?;
        let tracker = self
            .registry
            .create_tracker(HardwareId::derive(&address, 0), 0, self.origin)
            .await?;

        tracker
            .dispatch(TrackerAction::SetInfo {
                status: Some(TrackerStatus::Disconnected),
                sensor_kind: None,
            })
            .await?;
        if let Some(role) = TrackerRole::from_u32(role) {
            tracker
                .dispatch(TrackerAction::ChangeSettings(TrackerSettings {
                    body_part: Some(role.body_part()),
                    ..TrackerSettings::default()
                }))
                .await?;
        }
        let _ = tracker
            .dispatch_applied(TrackerAction::LinkDevice(device.handle()))
            .await?;

        let _ = self.trackers.insert(
            tracker_id,
            Mapped {
                device: device.handle(),
                tracker: tracker.handle(),
            },
        );
        Ok(())
    }

    async fn forward(&self, tracker_id: u32, action: TrackerAction) -> Result<()> {
        let tracker = self
            .trackers
            .get(&tracker_id)
            .and_then(|m| self.registry.tracker(m.tracker));
        match tracker {
            Some(tracker) => tracker.dispatch(action).await,
            None => Err(RuntimeError::UnknownTracker(format!("{}:{tracker_id}", self.origin))),
        }
    }

    /// Remove every device and tracker this session created.
    pub async fn close(self) -> Result<()> {
        for mapped in self.trackers.values() {
            self.registry.remove_tracker(mapped.tracker).await?;
            self.registry.remove_device(mapped.device).await?;
        }
        info!(origin = %self.origin, trackers = self.trackers.len(), "session closed");
        Ok(())
    }
}
