//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may contain any subset of fields; missing ones keep their defaults.

mod runtime;
mod server;

pub use runtime::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "udpPort": 6969 },
///   "runtime": { "heartbeatIntervalMs": 1000 },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VrtrackSettings {
    /// Network listener settings.
    pub server: ServerSettings,
    /// Actor queue sizes and protocol timers.
    pub runtime: RuntimeSettings,
    /// Tracker configuration store location.
    pub store: StoreSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Local driver/feeder inputs.
    pub inputs: InputSettings,
}

impl VrtrackSettings {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        fn non_zero(key: &'static str, value: u64) -> Result<()> {
            if value == 0 {
                return Err(SettingsError::InvalidValue {
                    key,
                    message: "must be greater than zero".into(),
                });
            }
            Ok(())
        }

        non_zero("server.udpPort", u64::from(self.server.udp_port))?;
        non_zero("server.maxDatagramSize", self.server.max_datagram_size as u64)?;
        non_zero(
            "runtime.actionQueueCapacity",
            self.runtime.action_queue_capacity as u64,
        )?;
        non_zero(
            "runtime.connectionInboxCapacity",
            self.runtime.connection_inbox_capacity as u64,
        )?;
        non_zero(
            "runtime.feedQueueCapacity",
            self.runtime.feed_queue_capacity as u64,
        )?;
        non_zero("runtime.heartbeatIntervalMs", self.runtime.heartbeat_interval_ms)?;
        non_zero("runtime.reconnectIdleMs", self.runtime.reconnect_idle_ms)?;
        non_zero("runtime.configDebounceMs", self.runtime.config_debounce_ms)?;
        if self.store.file_name.is_empty() {
            return Err(SettingsError::InvalidValue {
                key: "store.fileName",
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
