//! # vrtrack-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`VrtrackSettings::default()`]
//! 2. **User file**: `~/.vrtrack/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `VRTRACK_*` overrides (highest priority)
//!
//! The binary applies its command-line flags on top and then calls
//! [`VrtrackSettings::validate`] before starting anything.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, home_dir, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
