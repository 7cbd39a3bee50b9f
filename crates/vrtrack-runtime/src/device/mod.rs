//! Device actor: one physical unit (a tracker board, a driver-side device).
//!
//! State transitions are split across the modules in [`DEVICE_MODULES`],
//! folded in order: battery, heartbeat latency, signal strength.

mod battery;
mod ping;
mod signal_strength;

use std::ops::Deref;
use std::time::Duration;

use serde::Serialize;
use vrtrack_core::{Handle, Origin};

use crate::context::{Context, ModuleChain};

pub use battery::BatteryModule;
pub use ping::PingModule;
pub use signal_strength::SignalStrengthModule;

/// Battery reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Battery {
    /// Charge in `0.0..=1.0`.
    pub level: f32,
    /// Volts, when reported.
    pub voltage: Option<f32>,
}

/// Device state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceState {
    /// Registry handle.
    pub handle: Handle,
    /// Transport-specific unique key (MAC, `ip:port`, `driver://serial`).
    pub hardware_address: String,
    /// Display name.
    pub name: String,
    /// Last battery report.
    pub battery: Battery,
    /// Last Wi-Fi signal strength in dBm.
    pub signal_strength: Option<i8>,
    /// Last measured heartbeat round trip.
    pub ping: Option<Duration>,
    /// Input path that created the device.
    pub origin: Origin,
}

impl DeviceState {
    /// Fresh state for a newly discovered device.
    pub fn new(handle: Handle, hardware_address: impl Into<String>, origin: Origin) -> Self {
        Self {
            handle,
            hardware_address: hardware_address.into(),
            name: format!("Device #{handle}"),
            battery: Battery::default(),
            signal_strength: None,
            ping: None,
            origin,
        }
    }

    /// Copy with a new battery reading.
    #[must_use]
    pub fn with_battery(self, battery: Battery) -> Self {
        Self { battery, ..self }
    }

    /// Copy with a new round-trip time.
    #[must_use]
    pub fn with_ping(self, rtt: Duration) -> Self {
        Self {
            ping: Some(rtt),
            ..self
        }
    }

    /// Copy with a new signal strength.
    #[must_use]
    pub fn with_signal_strength(self, dbm: i8) -> Self {
        Self {
            signal_strength: Some(dbm),
            ..self
        }
    }
}

/// Device actions.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceAction {
    /// New battery reading.
    SetBattery {
        /// Charge in `0.0..=1.0`.
        level: f32,
        /// Volts, when reported.
        voltage: Option<f32>,
    },
    /// New heartbeat round trip.
    UpdatePing(Duration),
    /// New Wi-Fi signal strength.
    SetSignalStrength(i8),
}

/// Ordered reducer modules of a device.
pub const DEVICE_MODULES: ModuleChain<DeviceState, DeviceAction> =
    ModuleChain::new(&[&BatteryModule, &PingModule, &SignalStrengthModule]);

/// Handle to a device actor.
#[derive(Clone, Debug)]
pub struct DeviceContext {
    handle: Handle,
    context: Context<DeviceState, DeviceAction>,
}

impl DeviceContext {
    /// Start the actor.
    pub fn spawn(initial: DeviceState, capacity: usize) -> Self {
        Self {
            handle: initial.handle,
            context: Context::spawn("device", initial, DEVICE_MODULES, capacity),
        }
    }

    /// Registry handle.
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl Deref for DeviceContext {
    type Target = Context<DeviceState, DeviceAction>;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn modules_apply_their_own_actions() {
        let device = DeviceContext::spawn(DeviceState::new(Handle::new(1), "aa:bb", Origin::Udp), 8);
        let initial = device.ready().await.unwrap();
        assert_eq!(initial.name, "Device #1");

        device
            .dispatch(DeviceAction::SetBattery {
                level: 0.8,
                voltage: Some(3.9),
            })
            .await
            .unwrap();
        device
            .dispatch(DeviceAction::UpdatePing(Duration::from_millis(12)))
            .await
            .unwrap();
        let state = device
            .dispatch_applied(DeviceAction::SetSignalStrength(-55))
            .await
            .unwrap();

        assert_eq!(state.battery.level, 0.8);
        assert_eq!(state.battery.voltage, Some(3.9));
        assert_eq!(state.ping, Some(Duration::from_millis(12)));
        assert_eq!(state.signal_strength, Some(-55));
        assert_eq!(state.hardware_address, "aa:bb");
    }

    #[test]
    fn module_order() {
        assert_eq!(DEVICE_MODULES.names(), vec!["battery", "ping", "signal_strength"]);
    }
}
