use super::{TrackerAction, TrackerState};
use crate::context::ReducerModule;

/// Owning device. There is deliberately no unlink action.
pub struct LinkDeviceModule;

impl ReducerModule<TrackerState, TrackerAction> for LinkDeviceModule {
    fn name(&self) -> &'static str {
        "link_device"
    }

    fn reduce(&self, state: TrackerState, action: &TrackerAction) -> TrackerState {
        match action {
            TrackerAction::LinkDevice(device) => TrackerState {
                device: Some(*device),
                ..state
            },
            _ => state,
        }
    }
}
