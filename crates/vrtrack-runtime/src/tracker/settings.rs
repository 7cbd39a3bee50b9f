use super::{TrackerAction, TrackerState};
use crate::context::ReducerModule;

/// User-editable settings: body part, custom name, drift compensation.
pub struct SettingsModule;

impl ReducerModule<TrackerState, TrackerAction> for SettingsModule {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn reduce(&self, state: TrackerState, action: &TrackerAction) -> TrackerState {
        let TrackerAction::ChangeSettings(settings) = action else {
            return state;
        };

        let custom_name = match settings.display_name.as_deref() {
            Some("") => None,
            Some(name) => Some(name.to_owned()),
            None => state.custom_name.clone(),
        };

        TrackerState {
            body_part: settings.body_part.unwrap_or(state.body_part),
            allow_drift_compensation: settings
                .allow_drift_compensation
                .unwrap_or(state.allow_drift_compensation),
            custom_name,
            ..state
        }
    }
}
