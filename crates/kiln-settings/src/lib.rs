//! # kiln-settings
//!
//! Configuration management with layered sources for the Kiln orchestrator.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`KilnSettings::default()`]
//! 2. **User file** — `~/.kiln/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `KILN_*` overrides (highest priority)
//!
//! Loaded settings are injected explicitly into the orchestrator at startup;
//! there is no global singleton.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{EndpointConfig, EndpointSettings, KilnSettings, ServerSettings};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
