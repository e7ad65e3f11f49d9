use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL, DEFAULT_REQUEST_TIMEOUT,
};
use crate::types::ResourceKind;

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    pub app: AppConfig,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub polling: PollingConfig,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the JSON log file. No file is written when absent.
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default = "default_log_file")]
    pub file_name: String,
    #[serde(default)]
    pub rotation: LogRotation,
    /// Used when neither `RISK_LOG` nor `RUST_LOG` is set.
    #[serde(default = "default_log_filter")]
    pub default_filter: String,
    /// JSON lines on stderr instead of the compact human format.
    #[serde(default)]
    pub stderr_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

fn default_log_file() -> String {
    "risk-monitor.log".into()
}

fn default_log_filter() -> String {
    "lending_risk=info,warn".into()
}

// ---------------------------------------------------------------------------
// api.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Name of the env var holding the admin password.
    #[serde(default = "default_admin_password_env")]
    pub admin_password_env: String,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.into()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_admin_password_env() -> String {
    "RISK_ADMIN_PASSWORD".into()
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Read the admin password from the configured env var, if set.
    pub fn admin_password(&self) -> Option<String> {
        std::env::var(&self.admin_password_env)
            .ok()
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// cache.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub default_ttl_seconds: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Per-resource TTL overrides keyed by [`ResourceKind::name`].
    #[serde(default)]
    pub ttl_overrides: HashMap<String, u64>,
}

fn default_max_entries() -> usize {
    DEFAULT_CACHE_MAX_ENTRIES
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: DEFAULT_CACHE_TTL.as_secs(),
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            ttl_overrides: HashMap::new(),
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, kind: ResourceKind) -> Duration {
        let secs = self
            .ttl_overrides
            .get(kind.name())
            .copied()
            .unwrap_or(self.default_ttl_seconds);
        Duration::from_secs(secs)
    }
}

// ---------------------------------------------------------------------------
// polling.json (optional)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub enabled: bool,
    pub overview_interval_seconds: u64,
    pub positions_interval_seconds: u64,
    pub alerts_interval_seconds: u64,
    /// Poll with `cache: false` instead of waiting for TTL expiry.
    #[serde(default)]
    pub bypass_cache: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            overview_interval_seconds: 60,
            positions_interval_seconds: 60,
            alerts_interval_seconds: 30,
            bypass_cache: false,
        }
    }
}
