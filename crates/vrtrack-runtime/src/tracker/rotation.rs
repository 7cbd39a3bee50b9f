use super::{TrackerAction, TrackerState};
use crate::context::ReducerModule;

/// Orientation.
pub struct RotationModule;

impl ReducerModule<TrackerState, TrackerAction> for RotationModule {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn reduce(&self, state: TrackerState, action: &TrackerAction) -> TrackerState {
        match action {
            TrackerAction::SetRotation(rotation) => TrackerState {
                rotation: *rotation,
                ..state
            },
            _ => state,
        }
    }
}
