use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lending_risk::api::{AdminClient, HttpSource, RefreshRequest};
use lending_risk::config::{self, RiskConfig};
use lending_risk::constants::{DEFAULT_LIST_LIMIT, DEFAULT_RISK_THRESHOLD_HF};
use lending_risk::core::{RefreshScheduler, RiskDataService};
use lending_risk::logging;
use lending_risk::types::{Overview, RiskCategory};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("RISK_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        base_url = %config.api.base_url,
        default_ttl_secs = config.cache.default_ttl_seconds,
        polling = config.polling.enabled,
        "risk monitor starting"
    );

    let service = RiskDataService::from_config(&config.api, &config.cache)
        .context("failed to build risk data service")?;

    if std::env::var("RISK_REFRESH_ON_START").is_ok_and(|v| v == "true" || v == "1") {
        request_upstream_refresh(&config, &service).await;
    }

    let overview = service.overview(&[]).await;
    log_overview(&overview);

    if !config.polling.enabled {
        info!("polling disabled, exiting after one overview");
        return Ok(());
    }

    // -----------------------------------------------------------------------
    // Refresh loops
    // -----------------------------------------------------------------------

    let shutdown = CancellationToken::new();
    let mut scheduler = RefreshScheduler::with_token(shutdown.clone());
    let poller = if config.polling.bypass_cache {
        service.bypassing_cache()
    } else {
        service.clone()
    };

    {
        let svc = poller.clone();
        scheduler.spawn(
            "overview",
            Duration::from_secs(config.polling.overview_interval_seconds),
            move || {
                let svc = svc.clone();
                async move {
                    log_overview(&svc.overview(&[]).await);
                    anyhow::Ok(())
                }
            },
        );
    }

    {
        let svc = poller.clone();
        scheduler.spawn(
            "positions",
            Duration::from_secs(config.polling.positions_interval_seconds),
            move || {
                let svc = svc.clone();
                async move {
                    let page = svc
                        .risky_positions(DEFAULT_RISK_THRESHOLD_HF, 1, DEFAULT_LIST_LIMIT)
                        .await;
                    let state = page.state();
                    let page = page.into_data();
                    let critical = page
                        .positions
                        .iter()
                        .filter(|p| p.risk_category <= RiskCategory::Critical)
                        .count();
                    info!(
                        ?state,
                        risky = page.positions.len(),
                        critical,
                        total = ?page.page_info.map(|p| p.total_items),
                        "risky positions refreshed"
                    );
                    anyhow::Ok(())
                }
            },
        );
    }

    {
        let svc = poller;
        scheduler.spawn(
            "alerts",
            Duration::from_secs(config.polling.alerts_interval_seconds),
            move || {
                let svc = svc.clone();
                async move {
                    let alerts = svc.risk_alerts(None, DEFAULT_LIST_LIMIT).await;
                    let state = alerts.state();
                    let alerts = alerts.into_data();
                    if let Some(worst) = alerts.iter().max_by_key(|a| a.severity) {
                        info!(
                            ?state,
                            count = alerts.len(),
                            worst = worst.severity.as_str(),
                            message = %worst.message,
                            "risk alerts refreshed"
                        );
                    } else {
                        info!(?state, "no risk alerts");
                    }
                    anyhow::Ok(())
                }
            },
        );
    }

    info!(loops = scheduler.len(), "refresh loops running, press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    info!("shutdown signal received, stopping refresh loops");
    scheduler.shutdown().await;

    info!("shutdown complete");
    Ok(())
}

/// Ask upstream to reload its data, then drop our cache so the first reads
/// see the result.
async fn request_upstream_refresh(config: &RiskConfig, service: &RiskDataService) {
    let client = match HttpSource::new(config.api.timeout()) {
        Ok(source) => source.client().clone(),
        Err(e) => {
            warn!(error = %e, "cannot build admin HTTP client");
            return;
        }
    };
    let admin = match AdminClient::new(client, service.base_url().clone(), config.api.admin_password()) {
        Ok(admin) => admin,
        Err(e) => {
            warn!(error = %e, "skipping upstream refresh");
            return;
        }
    };

    match admin.refresh_data(&RefreshRequest::everything()).await {
        Ok(_) => service.invalidate_all(),
        Err(e) => warn!(error = %e, "upstream refresh failed"),
    }
}

fn log_overview(overview: &Overview) {
    let distribution: Vec<String> = overview
        .distribution
        .iter()
        .map(|(category, count)| format!("{}={count}", category.as_str()))
        .collect();

    info!(
        health_score = %overview.summary.health_score,
        ltv_percent = %overview.gauges.ltv_percent,
        avg_hf_gauge = %overview.gauges.average_health_factor,
        total_collateral_usd = %overview.summary.total_collateral_usd,
        total_debt_usd = %overview.summary.total_debt_usd,
        distribution = %distribution.join(" "),
        source = ?overview.distribution_source,
        degraded = overview.freshness.is_degraded(),
        "protocol overview"
    );
}
