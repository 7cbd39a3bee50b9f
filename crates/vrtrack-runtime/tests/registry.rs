//! Registry handle issuance and configuration persistence across sessions.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use common::{MAC, MAC_STR, Peer, options, peer, registry, registry_with, sensor_info};
use futures::future::join_all;
use vrtrack_core::{BodyPart, Handle, HardwareId, Origin};
use vrtrack_runtime::{
    FileConfigStore, MemoryConfigStore, TrackerAction, TrackerSettings, TrackerState,
};

#[tokio::test]
async fn sequential_creations_issue_increasing_handles() {
    let registry = registry().await;
    let mut handles = Vec::new();
    for i in 0..5 {
        let device = registry
            .create_device(format!("dev-{i}"), Origin::Udp)
            .await
            .unwrap();
        handles.push(device.handle());
        let tracker = registry
            .create_tracker(HardwareId::derive(&format!("dev-{i}"), 0), 0, Origin::Udp)
            .await
            .unwrap();
        handles.push(tracker.handle());
    }
    assert!(handles.windows(2).all(|w| w[0] < w[1]), "{handles:?}");
    assert_eq!(handles.first(), Some(&Handle::new(1)));
    assert_eq!(registry.state().last_handle, handles.last().copied());
}

#[tokio::test]
async fn concurrent_creations_never_share_a_handle() {
    let registry = registry().await;
    let created = join_all((0..32).map(|i| {
        let registry = registry.clone();
        async move {
            registry
                .create_device(format!("dev-{i}"), Origin::Udp)
                .await
                .unwrap()
                .handle()
        }
    }))
    .await;

    let unique: BTreeSet<Handle> = created.iter().copied().collect();
    assert_eq!(unique.len(), 32);
    assert_eq!(registry.state().devices.len(), 32);
}

async fn discover_sensor_zero(registry: &vrtrack_runtime::Registry) -> Arc<TrackerState> {
    let mut peer = Peer::connect(registry, peer(), options()).await;
    peer.handshake(MAC).await;
    peer.send_and_settle(sensor_info(0)).await;
    let handle = peer.connection.state().trackers[&0];
    registry
        .tracker(handle)
        .unwrap()
        .wait_until(|s| s.device.is_some())
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn body_part_survives_reconnect() {
    let registry = registry().await;

    let first = discover_sensor_zero(&registry).await;
    assert_eq!(first.hardware_id, HardwareId::derive(MAC_STR, 0));
    let tracker = registry.tracker(first.handle).unwrap();
    let _ = tracker
        .dispatch_applied(TrackerAction::ChangeSettings(TrackerSettings {
            body_part: Some(BodyPart::LeftUpperLeg),
            display_name: Some("left thigh".into()),
            ..TrackerSettings::default()
        }))
        .await
        .unwrap();
    tracker.save(registry.config()).await.unwrap();

    // Transport teardown, then the same device comes back.
    registry.remove_connection(peer().ip()).await.unwrap();
    registry.remove_tracker(first.handle).await.unwrap();

    let second = discover_sensor_zero(&registry).await;
    assert_ne!(second.handle, first.handle);
    assert_eq!(second.hardware_id, first.hardware_id);
    assert_eq!(second.body_part, BodyPart::LeftUpperLeg);
    assert_eq!(second.display_name(), "left thigh");
}

#[tokio::test(start_paused = true)]
async fn saves_are_coalesced() {
    let store = Arc::new(MemoryConfigStore::default());
    let registry = registry_with(store.clone()).await;
    let state = discover_sensor_zero(&registry).await;
    let tracker = registry.tracker(state.handle).unwrap();

    for part in [BodyPart::Chest, BodyPart::Hip, BodyPart::Waist, BodyPart::Chest] {
        let _ = tracker
            .dispatch_applied(TrackerAction::ChangeSettings(TrackerSettings {
                body_part: Some(part),
                ..TrackerSettings::default()
            }))
            .await
            .unwrap();
        tracker.save(registry.config()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(store.saves().is_empty());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let saves = store.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].trackers[&state.hardware_id].body_part, BodyPart::Chest);
}

#[tokio::test]
async fn file_store_carries_config_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let registry = registry_with(Arc::new(FileConfigStore::new(&path))).await;
    let state = discover_sensor_zero(&registry).await;
    let tracker = registry.tracker(state.handle).unwrap();
    let _ = tracker
        .dispatch_applied(TrackerAction::ChangeSettings(TrackerSettings {
            body_part: Some(BodyPart::RightFoot),
            ..TrackerSettings::default()
        }))
        .await
        .unwrap();
    tracker.save(registry.config()).await.unwrap();
    // Shutdown flushes the pending write without waiting for the window.
    registry.shutdown().await;
    assert!(path.exists());

    let restarted = registry_with(Arc::new(FileConfigStore::new(&path))).await;
    let state = discover_sensor_zero(&restarted).await;
    assert_eq!(state.body_part, BodyPart::RightFoot);
    restarted.shutdown().await;
}
