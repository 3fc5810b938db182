//! Settings types and compiled defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root settings for the orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KilnSettings {
    /// Settings schema version.
    pub version: String,
    /// Installation name.
    pub name: String,
    /// Orchestrator server settings.
    pub server: ServerSettings,
    /// Per-stage endpoint settings.
    pub endpoints: EndpointSettings,
}

impl Default for KilnSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "kiln".to_string(),
            server: ServerSettings::default(),
            endpoints: EndpointSettings::default(),
        }
    }
}

/// Orchestrator process settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Path to the session database. `None` uses the CLI default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    /// Maximum sessions processed concurrently.
    pub max_concurrent_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            db_path: None,
            max_concurrent_sessions: 32,
        }
    }
}

/// Settings for all three external agent endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointSettings {
    /// Image enhancement service.
    pub image_enhancer: EndpointConfig,
    /// Marketing nudge (caption) service.
    pub marketing_nudge: EndpointConfig,
    /// Inventory confirmation service.
    pub inventory: EndpointConfig,
}

/// One endpoint's base URL and call timeout.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointConfig {
    /// Base URL of the service.
    pub base_url: String,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8700".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl EndpointConfig {
    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
