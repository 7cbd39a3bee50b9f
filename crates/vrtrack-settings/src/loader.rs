//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`VrtrackSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `VRTRACK_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::VrtrackSettings;

/// The user's home directory, or `/tmp` when `HOME` is unset.
pub fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
}

/// Resolve the path to the settings file (`~/.vrtrack/settings.json`).
pub fn settings_path() -> PathBuf {
    home_dir().join(".vrtrack").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<VrtrackSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<VrtrackSettings> {
    let defaults = serde_json::to_value(VrtrackSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: VrtrackSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `VRTRACK_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut VrtrackSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are logged and ignored, keeping the file/default value.
pub fn apply_overrides(settings: &mut VrtrackSettings, lookup: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let ranged_u64 = |name: &str, min: u64, max: u64| {
        let val = lookup(name)?;
        let parsed = parse_u64_range(&val, min, max);
        if parsed.is_none() {
            tracing::warn!(key = name, value = %val, "invalid integer env var, ignoring");
        }
        parsed
    };
    let boolean = |name: &str| {
        let val = lookup(name)?;
        let parsed = parse_bool(&val);
        if parsed.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        parsed
    };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = string("VRTRACK_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = ranged_u64("VRTRACK_UDP_PORT", 1, 65_535).and_then(|v| u16::try_from(v).ok()) {
        settings.server.udp_port = v;
    }

    // ── Runtime ─────────────────────────────────────────────────────
    if let Some(v) = ranged_u64("VRTRACK_HEARTBEAT_INTERVAL_MS", 10, 600_000) {
        settings.runtime.heartbeat_interval_ms = v;
    }
    if let Some(v) = ranged_u64("VRTRACK_RECONNECT_IDLE_MS", 100, 3_600_000) {
        settings.runtime.reconnect_idle_ms = v;
    }
    if let Some(v) = ranged_u64("VRTRACK_CONFIG_DEBOUNCE_MS", 1, 600_000) {
        settings.runtime.config_debounce_ms = v;
    }

    // ── Store / logging / inputs ────────────────────────────────────
    if let Some(v) = string("VRTRACK_STORE_DIR") {
        settings.store.dir = PathBuf::from(v);
    }
    if let Some(v) = string("VRTRACK_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = boolean("VRTRACK_DRIVER_PIPE") {
        settings.inputs.driver_pipe = v;
    }
    if let Some(v) = boolean("VRTRACK_FEEDER_PIPE") {
        settings.inputs.feeder_pipe = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
