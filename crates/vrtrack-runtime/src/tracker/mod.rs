//! Tracker actor: one sensor, addressed by `(handle, local sensor index)`.
//!
//! A tracker's initial body part and custom name come from the persisted
//! configuration under its [`HardwareId`], and [`TrackerContext::save`] writes
//! them back. The reducer modules in [`TRACKER_MODULES`] are folded in order.

mod infos;
mod link_device;
mod position;
mod rotation;
mod settings;

use std::ops::Deref;

use serde::Serialize;
use vrtrack_core::{BodyPart, Handle, HardwareId, ImuType, Origin, Quaternion, TrackerStatus, Vector3};

use crate::config::{ConfigAction, ConfigContext, TrackerConfig};
use crate::context::{Context, ModuleChain};
use crate::errors::Result;

pub use infos::InfosModule;
pub use link_device::LinkDeviceModule;
pub use position::PositionModule;
pub use rotation::RotationModule;
pub use settings::SettingsModule;

/// Tracker state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackerState {
    /// Registry handle.
    pub handle: Handle,
    /// Index of the sensor on its device.
    pub sensor_index: u8,
    /// Durable configuration key.
    pub hardware_id: HardwareId,
    /// Generated display name.
    pub name: String,
    /// User-chosen name, overriding `name` for display.
    pub custom_name: Option<String>,
    /// Reported sensor chip.
    pub sensor_kind: Option<ImuType>,
    /// Connection status.
    pub status: TrackerStatus,
    /// Latest orientation.
    pub rotation: Quaternion,
    /// Latest position, for trackers that have one.
    pub position: Option<Vector3>,
    /// Assigned body part.
    pub body_part: BodyPart,
    /// Owning device. Never cleared once set.
    pub device: Option<Handle>,
    /// User setting forwarded to the skeleton solver.
    pub allow_drift_compensation: bool,
    /// Input path that created the tracker.
    pub origin: Origin,
}

impl TrackerState {
    /// Fresh state, seeded from the persisted configuration if any.
    pub fn new(
        handle: Handle,
        sensor_index: u8,
        hardware_id: HardwareId,
        origin: Origin,
        config: Option<&TrackerConfig>,
    ) -> Self {
        Self {
            handle,
            sensor_index,
            hardware_id,
            name: format!("Tracker #{handle}"),
            custom_name: config.and_then(|c| c.name.clone()),
            sensor_kind: None,
            status: TrackerStatus::None,
            rotation: Quaternion::IDENTITY,
            position: None,
            body_part: config.map(|c| c.body_part).unwrap_or_default(),
            device: None,
            allow_drift_compensation: false,
            origin,
        }
    }

    /// Custom name if set, generated name otherwise.
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.name)
    }

    /// The attributes persisted under the hardware id.
    pub fn to_config(&self) -> TrackerConfig {
        TrackerConfig {
            name: self.custom_name.clone(),
            body_part: self.body_part,
        }
    }
}

/// Partial settings change; `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackerSettings {
    /// New body part.
    pub body_part: Option<BodyPart>,
    /// New custom name. An empty string clears it.
    pub display_name: Option<String>,
    /// New drift-compensation flag.
    pub allow_drift_compensation: Option<bool>,
}

/// Tracker actions.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerAction {
    /// Status and/or sensor kind report. `None` fields keep their value.
    SetInfo {
        /// New status.
        status: Option<TrackerStatus>,
        /// New sensor kind.
        sensor_kind: Option<ImuType>,
    },
    /// New orientation.
    SetRotation(Quaternion),
    /// New position.
    SetPosition(Vector3),
    /// Attach to the owning device.
    LinkDevice(Handle),
    /// User-editable settings.
    ChangeSettings(TrackerSettings),
}

/// Ordered reducer modules of a tracker.
pub const TRACKER_MODULES: ModuleChain<TrackerState, TrackerAction> = ModuleChain::new(&[
    &InfosModule,
    &RotationModule,
    &PositionModule,
    &LinkDeviceModule,
    &SettingsModule,
]);

/// Handle to a tracker actor.
#[derive(Clone, Debug)]
pub struct TrackerContext {
    handle: Handle,
    context: Context<TrackerState, TrackerAction>,
}

impl TrackerContext {
    /// Start the actor.
    pub fn spawn(initial: TrackerState, capacity: usize) -> Self {
        Self {
            handle: initial.handle,
            context: Context::spawn("tracker", initial, TRACKER_MODULES, capacity),
        }
    }

    /// Registry handle.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Persist this tracker's name and body part.
    ///
    /// Returns once the configuration actor has applied the change; the write
    /// to disk follows after the debounce window.
    pub async fn save(&self, config: &ConfigContext) -> Result<()> {
        let state = self.state();
        let _ = config
            .dispatch_applied(ConfigAction::SetTrackerConfig {
                id: state.hardware_id.clone(),
                config: state.to_config(),
            })
            .await?;
        Ok(())
    }
}

impl Deref for TrackerContext {
    type Target = Context<TrackerState, TrackerAction>;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}
