//! Persistence backends for [`ConfigState`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::ConfigState;
use crate::errors::StoreError;

/// Where configuration is loaded from and saved to.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the stored configuration, or the default one if none exists.
    async fn load(&self) -> Result<ConfigState, StoreError>;

    /// Write the full configuration.
    async fn save(&self, state: &ConfigState) -> Result<(), StoreError>;
}

/// Pretty-printed JSON file.
#[derive(Clone, Debug)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<ConfigState, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                info!(path = %self.path.display(), "loading config file");
                Ok(serde_json::from_slice(&bytes)?)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "config file not found, using defaults");
                Ok(ConfigState::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, state: &ConfigState) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&self.path, json).await?;
        info!(path = %self.path.display(), trackers = state.trackers.len(), "saved config file");
        Ok(())
    }
}

/// In-memory store that records every save.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    initial: ConfigState,
    saves: Mutex<Vec<ConfigState>>,
}

impl MemoryConfigStore {
    /// Store whose `load` returns `initial`.
    pub fn new(initial: ConfigState) -> Self {
        Self {
            initial,
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Every state saved so far, oldest first.
    pub fn saves(&self) -> Vec<ConfigState> {
        self.saves.lock().clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<ConfigState, StoreError> {
        Ok(self
            .saves
            .lock()
            .last()
            .cloned()
            .unwrap_or_else(|| self.initial.clone()))
    }

    async fn save(&self, state: &ConfigState) -> Result<(), StoreError> {
        self.saves.lock().push(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use assert_matches::assert_matches;
    use vrtrack_core::{BodyPart, HardwareId};

    fn sample() -> ConfigState {
        let mut state = ConfigState::default();
        let _ = state.trackers.insert(
            HardwareId::from("aa:bb/0"),
            TrackerConfig {
                name: Some("chest".into()),
                body_part: BodyPart::Chest,
            },
        );
        state
    }

    #[tokio::test]
    async fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("config.json"));
        let state = store.load().await.unwrap();
        assert_eq!(state, ConfigState::default());
        assert_eq!(state.version, 1);
    }

    #[tokio::test]
    async fn save_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("nested").join("config.json"));
        store.save(&sample()).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"CHEST\""));
        assert!(raw.contains('\n'), "file should be pretty-printed");
        assert_eq!(store.load().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        let store = FileConfigStore::new(path);
        assert_matches!(store.load().await, Err(StoreError::Json(_)));
    }

    #[tokio::test]
    async fn memory_store_records_saves() {
        let store = MemoryConfigStore::new(ConfigState::default());
        store.save(&sample()).await.unwrap();
        assert_eq!(store.saves().len(), 1);
        assert_eq!(store.load().await.unwrap(), sample());
    }
}
