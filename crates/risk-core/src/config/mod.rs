pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load and merge all config JSON files into a single [`RiskConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   api.json
///   cache.json
///   polling.json   (optional)
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                      | Config Field                        |
/// |------------------------------|-------------------------------------|
/// | `RISK_API_BASE_URL`          | `api.base_url`                      |
/// | `RISK_API_TIMEOUT_SECONDS`   | `api.timeout_seconds`               |
/// | `RISK_CACHE_TTL_SECONDS`     | `cache.default_ttl_seconds`         |
/// | `RISK_POLLING_ENABLED`       | `polling.enabled`                   |
/// | `RISK_POLL_INTERVAL_SECONDS` | every `polling.*_interval_seconds`  |
pub fn load_config(config_dir: &Path) -> Result<RiskConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let api: ApiConfig = serde_json::from_str(&read("api.json")?).context("parsing api.json")?;

    let cache: CacheConfig =
        serde_json::from_str(&read("cache.json")?).context("parsing cache.json")?;

    // A missing polling.json means fetch once and exit; any other read error is fatal.
    let polling_path = config_dir.join("polling.json");
    let polling: PollingConfig = match std::fs::read_to_string(&polling_path) {
        Ok(contents) => serde_json::from_str(&contents).context("parsing polling.json")?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PollingConfig::default(),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("failed to read config file: {}", polling_path.display())
            })
        }
    };

    let mut config = RiskConfig {
        app,
        api,
        cache,
        polling,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides to the loaded config.
///
/// Only non-empty env vars take effect. Parse failures are skipped (the JSON
/// value remains).
fn apply_env_overrides(config: &mut RiskConfig) {
    if let Some(val) = env_string("RISK_API_BASE_URL") {
        info!(base_url = %val, "env override: RISK_API_BASE_URL");
        config.api.base_url = val;
    }

    if let Some(val) = env_parse::<u64>("RISK_API_TIMEOUT_SECONDS") {
        info!(val, "env override: RISK_API_TIMEOUT_SECONDS");
        config.api.timeout_seconds = val;
    }

    if let Some(val) = env_parse::<u64>("RISK_CACHE_TTL_SECONDS") {
        info!(val, "env override: RISK_CACHE_TTL_SECONDS");
        config.cache.default_ttl_seconds = val;
    }

    if let Some(val) = env_bool("RISK_POLLING_ENABLED") {
        info!(enabled = val, "env override: RISK_POLLING_ENABLED");
        config.polling.enabled = val;
    }

    if let Some(val) = env_parse::<u64>("RISK_POLL_INTERVAL_SECONDS") {
        info!(val, "env override: RISK_POLL_INTERVAL_SECONDS");
        config.polling.overview_interval_seconds = val;
        config.polling.positions_interval_seconds = val;
        config.polling.alerts_interval_seconds = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var as a bool (`true`, `1`, `yes` → true).
fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
