use super::{DeviceAction, DeviceState};
use crate::context::ReducerModule;

/// Wi-Fi signal strength.
pub struct SignalStrengthModule;

impl ReducerModule<DeviceState, DeviceAction> for SignalStrengthModule {
    fn name(&self) -> &'static str {
        "signal_strength"
    }

    fn reduce(&self, state: DeviceState, action: &DeviceAction) -> DeviceState {
        match action {
            DeviceAction::SetSignalStrength(dbm) => state.with_signal_strength(*dbm),
            _ => state,
        }
    }
}
