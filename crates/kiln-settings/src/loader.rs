//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`KilnSettings::default()`]
//! 2. If `~/.kiln/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::KilnSettings;

/// Resolve the path to the settings file (`~/.kiln/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".kiln").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<KilnSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<KilnSettings> {
    let defaults = serde_json::to_value(KilnSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: KilnSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
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

/// Apply environment variable overrides to loaded settings.
///
/// Integers must be valid and within the specified range; invalid values
/// are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut KilnSettings) {
    // ── Server settings ─────────────────────────────────────────────
    if let Some(v) = read_env_string("KILN_DB_PATH") {
        settings.server.db_path = Some(v);
    }
    if let Some(v) = read_env_usize("KILN_MAX_SESSIONS", 1, 10_000) {
        settings.server.max_concurrent_sessions = v;
    }

    // ── Endpoint settings ───────────────────────────────────────────
    if let Some(v) = read_env_string("KILN_IMAGE_ENHANCER_URL") {
        settings.endpoints.image_enhancer.base_url = v;
    }
    if let Some(v) = read_env_u64("KILN_IMAGE_ENHANCER_TIMEOUT_MS", 100, 600_000) {
        settings.endpoints.image_enhancer.timeout_ms = v;
    }
    if let Some(v) = read_env_string("KILN_MARKETING_NUDGE_URL") {
        settings.endpoints.marketing_nudge.base_url = v;
    }
    if let Some(v) = read_env_u64("KILN_MARKETING_NUDGE_TIMEOUT_MS", 100, 600_000) {
        settings.endpoints.marketing_nudge.timeout_ms = v;
    }
    if let Some(v) = read_env_string("KILN_INVENTORY_URL") {
        settings.endpoints.inventory.base_url = v;
    }
    if let Some(v) = read_env_u64("KILN_INVENTORY_TIMEOUT_MS", 100, 600_000) {
        settings.endpoints.inventory.timeout_ms = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
