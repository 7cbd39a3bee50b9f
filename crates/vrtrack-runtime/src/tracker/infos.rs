use super::{TrackerAction, TrackerState};
use crate::context::ReducerModule;

/// Status and sensor kind.
pub struct InfosModule;

impl ReducerModule<TrackerState, TrackerAction> for InfosModule {
    fn name(&self) -> &'static str {
        "infos"
    }

    fn reduce(&self, state: TrackerState, action: &TrackerAction) -> TrackerState {
        match action {
            TrackerAction::SetInfo {
                status,
                sensor_kind,
            } => TrackerState {
                status: status.unwrap_or(state.status),
                sensor_kind: sensor_kind.or(state.sensor_kind),
                ..state
            },
            _ => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrtrack_core::{Handle, HardwareId, ImuType, Origin, TrackerStatus};

    #[test]
    fn missing_fields_keep_previous_values() {
        let state = TrackerState {
            status: TrackerStatus::Ok,
            sensor_kind: Some(ImuType::Bmi160),
            ..TrackerState::new(Handle::new(1), 0, HardwareId::from("x/0"), Origin::Udp, None)
        };
        let next = InfosModule.reduce(
            state,
            &TrackerAction::SetInfo {
                status: Some(TrackerStatus::Error),
                sensor_kind: None,
            },
        );
        assert_eq!(next.status, TrackerStatus::Error);
        assert_eq!(next.sensor_kind, Some(ImuType::Bmi160));
    }
}
