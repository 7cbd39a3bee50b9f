use super::{Battery, DeviceAction, DeviceState};
use crate::context::ReducerModule;

/// Battery level and voltage.
pub struct BatteryModule;

impl ReducerModule<DeviceState, DeviceAction> for BatteryModule {
    fn name(&self) -> &'static str {
        "battery"
    }

    fn reduce(&self, state: DeviceState, action: &DeviceAction) -> DeviceState {
        match *action {
            DeviceAction::SetBattery { level, voltage } => {
                // Firmware without a voltage reading keeps the last known one.
                let voltage = voltage.or(state.battery.voltage);
                state.with_battery(Battery { level, voltage })
            }
            _ => state,
        }
    }
}
