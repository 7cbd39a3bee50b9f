use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::loader::home_dir;

/// Actor queue sizes and protocol timers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSettings {
    /// Bounded action queue per actor. Dispatchers wait when it is full.
    pub action_queue_capacity: usize,
    /// Datagrams buffered per UDP connection before new ones are dropped.
    pub connection_inbox_capacity: usize,
    /// Datafeed updates buffered per subscriber before new ones are dropped.
    pub feed_queue_capacity: usize,
    /// Heartbeat period for handshook trackers.
    pub heartbeat_interval_ms: u64,
    /// Idle time after which packet number 0 counts as a reconnect.
    pub reconnect_idle_ms: u64,
    /// Coalescing window for configuration writes.
    pub config_debounce_ms: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            action_queue_capacity: 256,
            connection_inbox_capacity: 256,
            feed_queue_capacity: 16,
            heartbeat_interval_ms: 1000,
            reconnect_idle_ms: 5000,
            config_debounce_ms: 1000,
        }
    }
}

/// Where tracker configuration is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Directory holding the configuration file.
    pub dir: PathBuf,
    /// Configuration file name inside `dir`.
    pub file_name: String,
}

impl StoreSettings {
    /// Full path of the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: home_dir().join(".vrtrack"),
            file_name: "config.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_joins_dir_and_name() {
        let store = StoreSettings {
            dir: PathBuf::from("/data/vr"),
            file_name: "trackers.json".into(),
        };
        assert_eq!(store.config_path(), PathBuf::from("/data/vr/trackers.json"));
    }
}
