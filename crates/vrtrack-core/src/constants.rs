//! Package-level constants and protocol defaults.

/// Current version of the server (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "vrtrack";

/// Default UDP port trackers send to.
pub const DEFAULT_UDP_PORT: u16 = 6969;

/// Interval between heartbeats sent to a handshook tracker.
pub const HEARTBEAT_INTERVAL_MS: u64 = 1000;

/// Idle time after which packet number 0 is treated as a reconnect.
pub const RECONNECT_IDLE_MS: u64 = 5000;

/// Coalescing window for configuration writes.
pub const CONFIG_DEBOUNCE_MS: u64 = 1000;

/// MAC address reported by firmware that has none.
pub const NULL_MAC: &str = "00:00:00:00:00:00";

/// Current on-disk configuration format version.
pub const CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
    }

    #[test]
    fn reconnect_window_exceeds_heartbeat() {
        assert!(RECONNECT_IDLE_MS > HEARTBEAT_INTERVAL_MS);
    }
}
