//! Control-channel requests.

use std::sync::Arc;

use tracing::{info, warn};
use vrtrack_runtime::{Registry, Result, TrackerAction, TrackerRef, TrackerSettings, TrackerState};

/// Apply a tracker reassignment and persist it.
///
/// Returns the updated tracker state, or `None` when the referenced tracker
/// is unknown; that is routine while trackers are still being discovered.
pub async fn assign_tracker(
    registry: &Registry,
    reference: TrackerRef,
    settings: TrackerSettings,
) -> Result<Option<Arc<TrackerState>>> {
    let Some(tracker) = registry.lookup_tracker(reference) else {
        warn!(
            tracker = %reference.tracker,
            device = ?reference.device,
            "assignment for unknown tracker ignored"
        );
        return Ok(None);
    };

    let state = tracker
        .dispatch_applied(TrackerAction::ChangeSettings(settings))
        .await?;
    tracker.save(registry.config()).await?;
    info!(
        tracker = %state.handle,
        body_part = ?state.body_part,
        name = state.display_name(),
        "tracker assigned"
    );
    Ok(Some(state))
}
