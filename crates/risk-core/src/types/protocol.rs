use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::risk::{RiskCategory, Severity};
use super::time::EventTime;

/// Headline counters from `/data/quick-stats`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QuickStats {
    pub positions: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_collateral_usd: Decimal,
    pub at_risk_positions: u64,
    pub critical_positions: u64,
    /// Fraction (0–1).
    #[serde(with = "rust_decimal::serde::str_option")]
    pub at_risk_percentage: Option<Decimal>,
    /// 0–100 when upstream computed one.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub health_score: Option<Decimal>,
    pub timestamp: EventTime,
}

/// Protocol-wide risk totals from `/protocol_risk_summary`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProtocolRiskSummary {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_collateral_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_debt_usd: Decimal,
    /// Fraction (0–1).
    #[serde(with = "rust_decimal::serde::str")]
    pub protocol_ltv: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub average_health_factor: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub at_risk_value_usd: Decimal,
    /// Fraction (0–1). `None` when upstream did not send it.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub at_risk_percentage: Option<Decimal>,
    pub chains_analyzed: Vec<String>,
    pub timestamp: EventTime,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PositionInsights {
    pub total_positions: u64,
    pub risky_positions: u64,
    pub critical_positions: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_collateral_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_debt_usd: Decimal,
    /// Fraction (0–1).
    #[serde(with = "rust_decimal::serde::str")]
    pub protocol_ltv: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub avg_health_factor: Option<Decimal>,
    /// Upstream histogram, when provided.
    pub risk_distribution: Option<BTreeMap<RiskCategory, u64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReserveInsights {
    pub total_reserves: u64,
    pub high_apy_reserves: u64,
    pub frozen_reserves: u64,
    pub high_ltv_reserves: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_supply_apy: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_borrow_apy: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LiquidationInsights {
    pub liquidations_30d: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_liquidated_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_liquidation_size: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidation_rate_per_day: Decimal,
}

/// Health score as computed by upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamHealthScore {
    /// 0–100.
    #[serde(with = "rust_decimal::serde::str")]
    pub score: Decimal,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolAlert {
    pub severity: Severity,
    pub kind: String,
    pub message: String,
    pub action: Option<String>,
}

/// Insight bundle from `/insights/protocol-health`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProtocolHealth {
    pub chains_analyzed: Vec<String>,
    pub position_insights: Option<PositionInsights>,
    pub reserve_insights: Option<ReserveInsights>,
    pub liquidation_insights: Option<LiquidationInsights>,
    pub health_score: Option<UpstreamHealthScore>,
    pub alerts: Vec<ProtocolAlert>,
    pub timestamp: EventTime,
}

/// Per-chain row of `/crosschain_risk_comparison`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainComparison {
    pub chain: String,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub average_health_factor: Option<Decimal>,
    /// Fraction (0–1).
    #[serde(with = "rust_decimal::serde::str")]
    pub debt_collateral_ratio: Decimal,
    pub total_positions: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_collateral_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_debt_usd: Decimal,
    pub liquidations_7d: u64,
    pub top_collateral_tokens: Vec<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub safety_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainDetail {
    pub chain: String,
    pub reserve_count: u64,
    pub position_count: u64,
    pub last_reserve_update: EventTime,
}

/// Chains the upstream service has data for.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AvailableChains {
    pub chains: Vec<String>,
    pub details: Vec<ChainDetail>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChainRiskBreakdown {
    pub count: u64,
    pub critical_count: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_at_risk_usd: Decimal,
}

/// Borrowers under a health-factor threshold, grouped by chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RiskyBorrowersSummary {
    #[serde(with = "rust_decimal::serde::str")]
    pub threshold: Decimal,
    pub total_risky_borrowers: u64,
    pub breakdown_by_chain: BTreeMap<String, ChainRiskBreakdown>,
}
