//! Persisted configuration actor.
//!
//! Holds the per-tracker settings keyed by [`HardwareId`]. Every applied
//! change is handed to a background persistence task that writes the newest
//! state through a [`ConfigStore`] one debounce window after the first
//! unsaved change. [`ConfigContext::shutdown`] flushes anything pending.

mod debounce;
mod store;

pub use debounce::Debouncer;
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use vrtrack_core::constants::CONFIG_VERSION;
use vrtrack_core::{BodyPart, HardwareId};

use crate::context::{Context, ModuleChain, ReducerModule, Snapshot};
use crate::errors::StoreError;

/// Persisted per-tracker attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// User-chosen display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Assigned body part.
    #[serde(default)]
    pub body_part: BodyPart,
}

/// The whole persisted configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// File format version.
    pub version: u32,
    /// Tracker settings by hardware id.
    #[serde(default)]
    pub trackers: BTreeMap<HardwareId, TrackerConfig>,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            trackers: BTreeMap::new(),
        }
    }
}

/// Configuration actions.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigAction {
    /// Insert or replace one tracker's settings.
    SetTrackerConfig {
        /// Durable tracker key.
        id: HardwareId,
        /// New settings.
        config: TrackerConfig,
    },
}

/// Applies [`ConfigAction::SetTrackerConfig`].
pub struct TrackerConfigModule;

impl ReducerModule<ConfigState, ConfigAction> for TrackerConfigModule {
    fn name(&self) -> &'static str {
        "trackers"
    }

    fn reduce(&self, mut state: ConfigState, action: &ConfigAction) -> ConfigState {
        match action {
            ConfigAction::SetTrackerConfig { id, config } => {
                let _ = state.trackers.insert(id.clone(), config.clone());
                state
            }
        }
    }
}

/// Ordered reducer modules of the configuration.
pub const CONFIG_MODULES: ModuleChain<ConfigState, ConfigAction> =
    ModuleChain::new(&[&TrackerConfigModule]);

/// Handle to the configuration actor and its persistence task.
#[derive(Clone, Debug)]
pub struct ConfigContext {
    context: Context<ConfigState, ConfigAction>,
    persistence: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ConfigContext {
    /// Load the stored configuration and start the actor.
    pub async fn load(
        store: Arc<dyn ConfigStore>,
        debounce: Duration,
        capacity: usize,
    ) -> Result<Self, StoreError> {
        let initial = store.load().await?;
        debug!(trackers = initial.trackers.len(), "configuration loaded");
        let context = Context::spawn("config", initial, CONFIG_MODULES, capacity);
        let task = tokio::spawn(persist(store, context.watch(), context.token(), debounce));
        Ok(Self {
            context,
            persistence: Arc::new(Mutex::new(Some(task))),
        })
    }

    /// Stored settings of one tracker.
    pub fn tracker(&self, id: &HardwareId) -> Option<TrackerConfig> {
        self.state().trackers.get(id).cloned()
    }

    /// Destroy the actor and wait for the final flush.
    pub async fn shutdown(&self) {
        self.destroy();
        let task = self.persistence.lock().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(error = %err, "config persistence task failed");
            }
        }
    }
}

impl Deref for ConfigContext {
    type Target = Context<ConfigState, ConfigAction>;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

async fn persist(
    store: Arc<dyn ConfigStore>,
    mut snapshots: watch::Receiver<Snapshot<ConfigState>>,
    cancel: CancellationToken,
    window: Duration,
) {
    // Revision 1 is the state just loaded; nothing to write for it.
    let mut seen = 1;
    let mut pending = Debouncer::new(window);

    loop {
        let deadline = pending.deadline();
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.revision > seen {
                    seen = snapshot.revision;
                    pending.push(snapshot.state, Instant::now());
                }
            }
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(state) = pending.poll(Instant::now()) {
                    flush(store.as_ref(), &state).await;
                }
            }
        }
    }

    let latest = snapshots.borrow().clone();
    if latest.revision > seen {
        pending.push(latest.state, Instant::now());
    }
    if let Some(state) = pending.drain() {
        flush(store.as_ref(), &state).await;
    }
}

async fn flush(store: &dyn ConfigStore, state: &ConfigState) {
    if let Err(err) = store.save(state).await {
        error!(error = %err, "failed to save configuration");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
