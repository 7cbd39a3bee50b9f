use super::{TrackerAction, TrackerState};
use crate::context::ReducerModule;

/// Position, for trackers that report one.
pub struct PositionModule;

impl ReducerModule<TrackerState, TrackerAction> for PositionModule {
    fn name(&self) -> &'static str {
        "position"
    }

    fn reduce(&self, state: TrackerState, action: &TrackerAction) -> TrackerState {
        match action {
            TrackerAction::SetPosition(position) => TrackerState {
                position: Some(*position),
                ..state
            },
            _ => state,
        }
    }
}
