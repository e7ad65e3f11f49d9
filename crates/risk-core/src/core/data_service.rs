//! Risk data service: the single entry point views use to read the
//! aggregation API.
//!
//! Every read goes endpoint → URL → fetch gateway → normalizer, and for
//! positions and signals → classifier. Reads never fail: they return a
//! [`Fetched`] that says whether the data is fresh, stale-cached or missing.
//! The only error a read can return is a local validation failure, raised
//! before any request is made.
//!
//! Caching (per-resource TTL from `cache.json`, default 60 s) is shared by
//! every clone of the service.

use std::sync::Arc;

use reqwest::Url;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use super::aggregator::{aggregate, needs_positions_sample, OverviewInputs};
use super::classifier::annotate_all;
use super::fetched::Fetched;
use super::gateway::{FetchGateway, FetchOptions};
use super::normalizer;
use crate::api::{Endpoint, HttpSource, JsonSource, PositionsQuery};
use crate::config::{ApiConfig, CacheConfig};
use crate::constants::DISTRIBUTION_SAMPLE_LIMIT;
use crate::errors::RiskDataError;
use crate::types::{
    AvailableChains, ChainComparison, Classified, LiquidationEvent, LiquidationTrends, Overview,
    OverviewFreshness, Position, PositionPage, ProtocolHealth, ProtocolRiskSummary, QuickStats,
    Reserve, ReserveRiskMetric, RiskAlert, RiskSignal, RiskyBorrowersSummary, Severity,
};

#[derive(Clone)]
pub struct RiskDataService {
    source: Arc<dyn JsonSource>,
    gateway: Arc<FetchGateway<Value>>,
    base: Url,
    cache: Arc<CacheConfig>,
    use_cache: bool,
}

impl RiskDataService {
    pub fn new(source: Arc<dyn JsonSource>, base: Url, cache: CacheConfig) -> Self {
        let gateway = Arc::new(FetchGateway::new(cache.max_entries));
        Self {
            source,
            gateway,
            base,
            cache: Arc::new(cache),
            use_cache: true,
        }
    }

    /// HTTP-backed service from the loaded configuration.
    pub fn from_config(api: &ApiConfig, cache: &CacheConfig) -> Result<Self, RiskDataError> {
        let base = Url::parse(&api.base_url).map_err(|e| RiskDataError::InvalidUrl {
            reason: format!("{}: {e}", api.base_url),
        })?;
        let source = HttpSource::new(api.timeout())?;
        Ok(Self::new(Arc::new(source), base, cache.clone()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn gateway(&self) -> &Arc<FetchGateway<Value>> {
        &self.gateway
    }

    /// A clone whose reads skip the cache (still coalesced, still stored).
    pub fn bypassing_cache(&self) -> Self {
        Self {
            use_cache: false,
            ..self.clone()
        }
    }

    pub fn invalidate_all(&self) {
        self.gateway.clear(None);
        debug!("response cache cleared");
    }

    async fn fetch(&self, endpoint: &Endpoint) -> Fetched<Value> {
        let url = match endpoint.url(&self.base) {
            Ok(url) => url,
            Err(error) => return Fetched::Unavailable { error },
        };
        let options = FetchOptions {
            cache: self.use_cache,
            ttl: self.cache.ttl_for(endpoint.kind()),
        };
        let key = url.to_string();
        let source = Arc::clone(&self.source);

        let fetched = self
            .gateway
            .resolve(&key, options, move || async move { source.get_json(&url).await })
            .await;
        if let Some(error) = fetched.error() {
            warn!(resource = endpoint.kind().name(), state = ?fetched.state(), %error, "degraded read");
        }
        fetched
    }

    // -----------------------------------------------------------------------
    // Protocol-level resources
    // -----------------------------------------------------------------------

    pub async fn quick_stats(&self) -> Fetched<QuickStats> {
        self.fetch(&Endpoint::QuickStats)
            .await
            .map(|raw| normalizer::normalize_quick_stats(&raw))
    }

    pub async fn protocol_health(&self, chains: &[String]) -> Fetched<ProtocolHealth> {
        self.fetch(&Endpoint::ProtocolHealth {
            chains: chains.to_vec(),
        })
        .await
        .map(|raw| normalizer::normalize_protocol_health(&raw))
    }

    pub async fn risk_summary(&self, chains: &[String]) -> Fetched<ProtocolRiskSummary> {
        self.fetch(&Endpoint::RiskSummary {
            chains: chains.to_vec(),
        })
        .await
        .map(|raw| normalizer::normalize_risk_summary(&raw))
    }

    pub async fn risky_borrowers(
        &self,
        threshold: Decimal,
        chains: &[String],
    ) -> Fetched<RiskyBorrowersSummary> {
        self.fetch(&Endpoint::RiskyBorrowers {
            threshold,
            chains: chains.to_vec(),
        })
        .await
        .map(|raw| normalizer::normalize_risky_borrowers(&raw))
    }

    pub async fn cross_chain_comparison(&self) -> Fetched<Vec<ChainComparison>> {
        self.fetch(&Endpoint::CrossChain)
            .await
            .map(|raw| normalizer::normalize_chain_comparison(&raw))
    }

    pub async fn available_chains(&self) -> Fetched<AvailableChains> {
        self.fetch(&Endpoint::Chains)
            .await
            .map(|raw| normalizer::normalize_available_chains(&raw))
    }

    // -----------------------------------------------------------------------
    // Positions and signals
    // -----------------------------------------------------------------------

    async fn positions_raw(&self, query: PositionsQuery) -> Fetched<Vec<Position>> {
        let endpoint = Endpoint::Positions(query);
        let kind = endpoint.kind();
        self.fetch(&endpoint)
            .await
            .map(|raw| normalizer::normalize_positions(&raw, kind))
    }

    pub async fn positions(&self, query: PositionsQuery) -> Fetched<Vec<Classified<Position>>> {
        self.positions_raw(query).await.map(annotate_all)
    }

    /// Positions of one borrower. The address is checked before any request.
    pub async fn borrower_positions(
        &self,
        address: &str,
    ) -> Result<Fetched<Vec<Classified<Position>>>, RiskDataError> {
        let address = validate_address(address)?;
        Ok(self
            .positions(PositionsQuery {
                borrower_address: Some(address),
                ..PositionsQuery::default()
            })
            .await)
    }

    pub async fn risky_positions(
        &self,
        threshold_hf: Decimal,
        page: u32,
        page_size: u32,
    ) -> Fetched<PositionPage> {
        self.position_page(Endpoint::RiskyPositions {
            threshold_hf,
            page,
            page_size,
        })
        .await
    }

    pub async fn positions_summary(&self, page: u32, page_size: u32) -> Fetched<PositionPage> {
        self.position_page(Endpoint::PositionsSummary { page, page_size })
            .await
    }

    async fn position_page(&self, endpoint: Endpoint) -> Fetched<PositionPage> {
        let kind = endpoint.kind();
        self.fetch(&endpoint).await.map(|raw| PositionPage {
            positions: annotate_all(normalizer::normalize_positions(&raw, kind)),
            page_info: normalizer::normalize_page_info(&raw),
        })
    }

    pub async fn risk_signals(
        &self,
        threshold: Decimal,
        limit: u32,
    ) -> Fetched<Vec<Classified<RiskSignal>>> {
        self.fetch(&Endpoint::RiskSignals { threshold, limit })
            .await
            .map(|raw| annotate_all(normalizer::normalize_signals(&raw)))
    }

    // -----------------------------------------------------------------------
    // Reserves, liquidations, alerts
    // -----------------------------------------------------------------------

    pub async fn reserves(
        &self,
        chains: &[String],
        active_only: bool,
        limit: u32,
    ) -> Fetched<Vec<Reserve>> {
        self.fetch(&Endpoint::Reserves {
            chains: chains.to_vec(),
            active_only,
            limit,
        })
        .await
        .map(|raw| normalizer::normalize_reserves(&raw))
    }

    pub async fn reserve_risk_metrics(&self, chains: &[String]) -> Fetched<Vec<ReserveRiskMetric>> {
        self.fetch(&Endpoint::ReserveRiskMetrics {
            chains: chains.to_vec(),
        })
        .await
        .map(|raw| normalizer::normalize_reserve_risk_metrics(&raw))
    }

    pub async fn liquidation_history(
        &self,
        limit: u32,
        chain: Option<&str>,
    ) -> Fetched<Vec<LiquidationEvent>> {
        self.fetch(&Endpoint::LiquidationHistory {
            limit,
            chain: chain.map(String::from),
        })
        .await
        .map(|raw| normalizer::normalize_liquidations(&raw))
    }

    pub async fn liquidation_trends(&self, days: u32, chains: &[String]) -> Fetched<LiquidationTrends> {
        self.fetch(&Endpoint::LiquidationTrends {
            days,
            chains: chains.to_vec(),
        })
        .await
        .map(|raw| normalizer::normalize_liquidation_trends(&raw))
    }

    pub async fn risk_alerts(&self, severity: Option<Severity>, limit: u32) -> Fetched<Vec<RiskAlert>> {
        self.fetch(&Endpoint::RiskAlerts { severity, limit })
            .await
            .map(|raw| normalizer::normalize_alerts(&raw))
    }

    // -----------------------------------------------------------------------
    // Overview
    // -----------------------------------------------------------------------

    /// Everything the overview needs, fetched concurrently and folded into
    /// summary, gauges and histogram. Any subset of inputs may fail.
    pub async fn overview(&self, chains: &[String]) -> Overview {
        let (stats, health, summary) = tokio::join!(
            self.quick_stats(),
            self.protocol_health(chains),
            self.risk_summary(chains),
        );

        let sample = if needs_positions_sample(health.data()) {
            Some(
                self.positions_raw(PositionsQuery {
                    limit: DISTRIBUTION_SAMPLE_LIMIT,
                    ..PositionsQuery::default()
                })
                .await,
            )
        } else {
            None
        };

        let inputs = OverviewInputs {
            quick_stats: stats.data(),
            protocol_health: health.data(),
            risk_summary: summary.data(),
            positions_sample: sample.as_ref().and_then(Fetched::data).map(Vec::as_slice),
        };
        let agg = aggregate(&inputs);

        let freshness = OverviewFreshness {
            quick_stats: stats.state(),
            protocol_health: health.state(),
            risk_summary: summary.state(),
            positions_sample: sample.as_ref().map(Fetched::state),
        };
        if freshness.is_degraded() {
            warn!(?freshness, "overview built from degraded inputs");
        }

        Overview {
            summary: agg.summary,
            gauges: agg.gauges,
            distribution: agg.distribution,
            distribution_source: agg.distribution_source,
            freshness,
        }
    }
}

/// Check an EVM address: `0x` followed by 40 hex characters. Returns the
/// trimmed address.
pub fn validate_address(input: &str) -> Result<String, RiskDataError> {
    let addr = input.trim();
    let invalid = |reason: String| RiskDataError::InvalidAddress {
        input: input.to_string(),
        reason,
    };

    if addr.is_empty() {
        return Err(invalid("address is empty".into()));
    }
    if !addr.starts_with("0x") && !addr.starts_with("0X") {
        return Err(invalid("must start with 0x".into()));
    }
    if addr.len() != 42 {
        return Err(invalid(format!("has length {} (expected 42)", addr.len())));
    }
    if !addr[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters".into()));
    }
    Ok(addr.to_string())
}
