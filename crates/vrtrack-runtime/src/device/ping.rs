use super::{DeviceAction, DeviceState};
use crate::context::ReducerModule;

/// Heartbeat round-trip time.
pub struct PingModule;

impl ReducerModule<DeviceState, DeviceAction> for PingModule {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn reduce(&self, state: DeviceState, action: &DeviceAction) -> DeviceState {
        match action {
            DeviceAction::UpdatePing(rtt) => state.with_ping(*rtt),
            _ => state,
        }
    }
}
