use anyhow::{bail, Result};
use reqwest::Url;
use tracing_subscriber::EnvFilter;

use super::types::RiskConfig;

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Called automatically by [`super::load_config`].
pub fn validate_config(config: &RiskConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_app_config(config, &mut errors);
    validate_api_config(config, &mut errors);
    validate_cache_config(config, &mut errors);
    validate_polling_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

fn validate_app_config(config: &RiskConfig, errors: &mut Vec<String>) {
    let logging = &config.app.logging;
    if let Some(dir) = &logging.log_dir {
        if dir.trim().is_empty() {
            errors.push("app.logging: log_dir is empty (omit it to disable the log file)".into());
        }
        if logging.file_name.trim().is_empty() {
            errors.push("app.logging: file_name is empty".into());
        }
    }
    if let Err(e) = EnvFilter::try_new(&logging.default_filter) {
        errors.push(format!(
            "app.logging: invalid default_filter '{}': {e}",
            logging.default_filter
        ));
    }
}

fn validate_api_config(config: &RiskConfig, errors: &mut Vec<String>) {
    let api = &config.api;

    match Url::parse(&api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(format!(
            "api.base_url: scheme must be http or https, got '{}'",
            url.scheme()
        )),
        Err(e) => errors.push(format!("api.base_url: '{}' is not a valid URL ({e})", api.base_url)),
    }

    if api.timeout_seconds == 0 {
        errors.push("api.timeout_seconds must be > 0".into());
    }

    if api.admin_password_env.is_empty() {
        errors.push("api.admin_password_env is empty".into());
    }
}

fn validate_cache_config(config: &RiskConfig, errors: &mut Vec<String>) {
    let cache = &config.cache;

    if cache.default_ttl_seconds == 0 {
        errors.push("cache.default_ttl_seconds must be > 0".into());
    }
    if cache.max_entries == 0 {
        errors.push("cache.max_entries must be > 0".into());
    }

    let mut overrides: Vec<_> = cache.ttl_overrides.iter().collect();
    overrides.sort();
    for (name, ttl) in overrides {
        if *ttl == 0 {
            errors.push(format!("cache.ttl_overrides.{name} must be > 0"));
        }
    }
}

fn validate_polling_config(config: &RiskConfig, errors: &mut Vec<String>) {
    let polling = &config.polling;
    if !polling.enabled {
        return;
    }

    let intervals = [
        ("overview_interval_seconds", polling.overview_interval_seconds),
        ("positions_interval_seconds", polling.positions_interval_seconds),
        ("alerts_interval_seconds", polling.alerts_interval_seconds),
    ];
    for (name, secs) in intervals {
        if secs == 0 {
            errors.push(format!("polling.{name} must be >= 1 when polling is enabled"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApiConfig, AppConfig, CacheConfig, LogRotation, LoggingConfig, PollingConfig,
    };

    fn valid_config() -> RiskConfig {
        RiskConfig {
            app: AppConfig {
                logging: LoggingConfig {
                    log_dir: Some("logs".into()),
                    file_name: "risk-monitor.log".into(),
                    rotation: LogRotation::Daily,
                    default_filter: "lending_risk=info".into(),
                    stderr_json: false,
                },
            },
            api: ApiConfig {
                base_url: "https://risk.example.com/api".into(),
                timeout_seconds: 10,
                admin_password_env: "RISK_ADMIN_PASSWORD".into(),
            },
            cache: CacheConfig::default(),
            polling: PollingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let mut config = valid_config();
        config.api.base_url = "ftp://risk.example.com".into();
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("scheme must be http or https"), "{err}");
    }

    #[test]
    fn test_unparseable_url_rejected() {
        let mut config = valid_config();
        config.api.base_url = "not a url".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = valid_config();
        config.api.timeout_seconds = 0;
        config.cache.default_ttl_seconds = 0;
        config.cache.ttl_overrides.insert("positions".into(), 0);
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("3 errors"), "{err}");
        assert!(err.contains("cache.ttl_overrides.positions"));
    }

    #[test]
    fn test_logging_checks() {
        let mut config = valid_config();
        config.app.logging.log_dir = None;
        config.app.logging.file_name = String::new();
        assert!(validate_config(&config).is_ok(), "file name unused without a log dir");

        config.app.logging.log_dir = Some(" ".into());
        config.app.logging.default_filter = "lending_risk=loud".into();
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("3 errors"), "{err}");
        assert!(err.contains("invalid default_filter"), "{err}");
    }

    #[test]
    fn test_zero_interval_only_matters_when_enabled() {
        let mut config = valid_config();
        config.polling.overview_interval_seconds = 0;
        assert!(validate_config(&config).is_ok());

        config.polling.enabled = true;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("polling.overview_interval_seconds"));
    }
}
