//! Boundary normalizer: raw JSON of unknown shape → typed records.
//!
//! List resources arrive in one of three envelopes (see [`Envelope`]); any
//! other shape normalizes to an empty list. Inside a record every field is
//! optional: a missing number becomes zero (or `None` where the type allows
//! it), a bad date becomes [`EventTime::Unknown`]. Only values that are not
//! JSON objects are dropped.
//!
//! Canonical units:
//!   - USD values: plain USD, `Decimal`.
//!   - Ratios (LTV, liquidation threshold, APYs, utilization, at-risk share,
//!     chain share): fraction 0–1. Inputs above 1 are taken as percentages.
//!   - Liquidation bonus: premium fraction (`0.05` for 5%), from a premium
//!     fraction, a multiplier (`1.05`) or a percentage (`5` or `105`).
//!   - Health score: 0–100 as sent.

use std::collections::BTreeMap;

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Map, Value};
use tracing::trace;

use crate::types::{
    AssetCount, AvailableChains, ChainComparison, ChainDetail, ChainRiskBreakdown, ChainShare,
    EventTime, HealthFactor, LiquidationEvent, LiquidationInsights, LiquidationTrends, PageInfo,
    Position, PositionInsights, ProtocolAlert, ProtocolHealth, ProtocolRiskSummary, QuickStats,
    Reserve, ReserveInsights, ReserveRiskMetric, ResourceKind, RiskAlert, RiskCategory,
    RiskSignal, RiskyBorrowersSummary, Severity, UpstreamHealthScore,
};

type Object = Map<String, Value>;

// ═══════════════════════════════════════════════════════════════════════════
// Envelopes
// ═══════════════════════════════════════════════════════════════════════════

/// Accepted shapes of a list payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Envelope<'a> {
    /// `[ ... ]`
    Bare(&'a [Value]),
    /// `{ "<resource>": [ ... ] }`
    Keyed(&'a [Value]),
    /// `{ "data": [ ... ] }`
    Data(&'a [Value]),
    Unrecognized,
}

impl<'a> Envelope<'a> {
    pub fn detect(raw: &'a Value, kind: ResourceKind) -> Self {
        match raw {
            Value::Array(items) => Self::Bare(items),
            Value::Object(obj) => {
                if let Some(Value::Array(items)) = kind.envelope_key().and_then(|k| obj.get(k)) {
                    return Self::Keyed(items);
                }
                match obj.get("data") {
                    Some(Value::Array(items)) => Self::Data(items),
                    _ => Self::Unrecognized,
                }
            }
            _ => Self::Unrecognized,
        }
    }

    pub fn records(&self) -> &'a [Value] {
        match self {
            Self::Bare(items) | Self::Keyed(items) | Self::Data(items) => items,
            Self::Unrecognized => &[],
        }
    }
}

/// Apply `parse` to every object record of a list payload.
fn normalize_list<T>(
    raw: &Value,
    kind: ResourceKind,
    parse: impl Fn(&Object, usize) -> T,
) -> Vec<T> {
    let envelope = Envelope::detect(raw, kind);
    if envelope == Envelope::Unrecognized {
        trace!(resource = kind.name(), "unrecognized envelope, normalizing to empty list");
    }

    envelope
        .records()
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match record.as_object() {
            Some(obj) => Some(parse(obj, index)),
            None => {
                trace!(resource = kind.name(), index, "skipping non-object record");
                None
            }
        })
        .collect()
}

/// Object payloads are sometimes wrapped as `{ "data": { ... } }`.
fn object_payload(raw: &Value) -> Option<&Object> {
    let obj = raw.as_object()?;
    match obj.get("data") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(obj),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// List resources
// ═══════════════════════════════════════════════════════════════════════════

pub fn normalize_positions(raw: &Value, kind: ResourceKind) -> Vec<Position> {
    normalize_list(raw, kind, |obj, _| parse_position(obj))
}

fn parse_position(obj: &Object) -> Position {
    let debt_usd =
        decimal(first(obj, &["debt_usd", "total_debt_usd", "totaldebtusd"])).unwrap_or_default();
    let health_factor = if debt_usd <= Decimal::ZERO {
        HealthFactor::INFINITE
    } else {
        HealthFactor::from(decimal(first(
            obj,
            &[
                "enhanced_health_factor",
                "health_factor",
                "healthfactor",
                "lowest_health_factor",
                "lowesthealthfactor",
            ],
        )))
    };

    Position {
        borrower_address: text(first(obj, &["borrower_address", "borrower"])).unwrap_or_default(),
        chain: text(obj.get("chain")).unwrap_or_default(),
        token_symbol: text(first(obj, &["token_symbol", "symbol"])).unwrap_or_default(),
        token_address: text(obj.get("token_address")),
        collateral_amount: decimal(obj.get("collateral_amount")),
        debt_amount: decimal(obj.get("debt_amount")),
        collateral_usd: decimal(first(
            obj,
            &["collateral_usd", "total_collateral_usd", "totalcollateralusd"],
        ))
        .unwrap_or_default(),
        debt_usd,
        health_factor,
        upstream_risk_category: text(obj.get("risk_category"))
            .as_deref()
            .and_then(RiskCategory::parse),
        last_updated: EventTime::parse(obj.get("last_updated")),
    }
}

/// Pagination block of `/positions/risky` (`pagination: {...}`) or
/// `/positions_summary` (top-level fields).
pub fn normalize_page_info(raw: &Value) -> Option<PageInfo> {
    let root = raw.as_object()?;
    let obj = match root.get("pagination") {
        Some(Value::Object(inner)) => inner,
        _ => root,
    };
    let page = u64_field(obj.get("page"))?;

    Some(PageInfo {
        page: page as u32,
        page_size: u64_field(obj.get("page_size")).unwrap_or(0) as u32,
        total_items: u64_field(first(obj, &["total_items", "total_positions"])).unwrap_or(0),
        total_pages: u64_field(obj.get("total_pages")).unwrap_or(0) as u32,
        has_next: flag(obj.get("has_next"), false),
        has_prev: flag(obj.get("has_prev"), false),
    })
}

pub fn normalize_reserves(raw: &Value) -> Vec<Reserve> {
    normalize_list(raw, ResourceKind::Reserves, |obj, _| Reserve {
        chain: text(obj.get("chain")).unwrap_or_default(),
        token_symbol: text(obj.get("token_symbol")).unwrap_or_default(),
        token_address: text(obj.get("token_address")).unwrap_or_default(),
        ltv: ratio(obj.get("ltv")).unwrap_or_default(),
        liquidation_threshold: ratio(obj.get("liquidation_threshold")).unwrap_or_default(),
        liquidation_bonus: bonus(obj.get("liquidation_bonus")).unwrap_or_default(),
        supply_apy: ratio(obj.get("supply_apy")),
        borrow_apy: ratio(obj.get("borrow_apy")),
        price_usd: decimal(obj.get("price_usd")).unwrap_or_default(),
        is_active: flag(obj.get("is_active"), true),
        is_frozen: flag(obj.get("is_frozen"), false),
        borrowing_enabled: flag(obj.get("borrowing_enabled"), true),
        query_time: EventTime::parse(obj.get("query_time")),
    })
}

pub fn normalize_reserve_risk_metrics(raw: &Value) -> Vec<ReserveRiskMetric> {
    normalize_list(raw, ResourceKind::ReserveRiskMetrics, |obj, _| ReserveRiskMetric {
        chain: text(obj.get("chain")).unwrap_or_default(),
        token_symbol: text(obj.get("token_symbol")).unwrap_or_default(),
        token_address: text(obj.get("token_address")).unwrap_or_default(),
        utilization_rate: ratio(obj.get("utilization_rate")).unwrap_or_default(),
        ltv: ratio(obj.get("ltv")).unwrap_or_default(),
        liquidation_threshold: ratio(obj.get("liquidation_threshold")).unwrap_or_default(),
        liquidation_bonus: bonus(obj.get("liquidation_bonus")).unwrap_or_default(),
        is_frozen: flag(obj.get("is_frozen"), false),
        borrowing_enabled: flag(obj.get("borrowing_enabled"), true),
        price_usd: decimal(obj.get("price_usd")).unwrap_or_default(),
        total_exposure_usd: decimal(obj.get("total_exposure_usd")).unwrap_or_default(),
        position_count: u64_field(obj.get("position_count")).unwrap_or(0),
        top_borrower_exposure: ratio(obj.get("top_borrower_exposure")).unwrap_or_default(),
        risk_score: decimal(obj.get("risk_score")).unwrap_or_default(),
        risk_level: text(obj.get("risk_level")).unwrap_or_else(|| "UNKNOWN".into()),
    })
}

pub fn normalize_liquidations(raw: &Value) -> Vec<LiquidationEvent> {
    normalize_list(raw, ResourceKind::LiquidationHistory, |obj, index| LiquidationEvent {
        id: text(obj.get("id")).unwrap_or_else(|| index.to_string()),
        chain: text(obj.get("chain")).unwrap_or_default(),
        borrower: text(first(obj, &["borrower", "borrower_address"])),
        collateral_symbol: text(obj.get("collateral_symbol")).unwrap_or_default(),
        debt_symbol: text(obj.get("debt_symbol")).unwrap_or_default(),
        collateral_seized_usd: decimal(first(
            obj,
            &["collateral_seized_usd", "liquidated_collateral_usd"],
        ))
        .unwrap_or_default(),
        debt_repaid_usd: decimal(first(obj, &["debt_repaid_usd", "liquidated_debt_usd"])),
        liquidation_date: EventTime::parse(first(obj, &["liquidation_date", "timestamp"])),
    })
}

pub fn normalize_alerts(raw: &Value) -> Vec<RiskAlert> {
    normalize_list(raw, ResourceKind::RiskAlerts, |obj, index| RiskAlert {
        id: text(first(obj, &["alert_id", "id"])).unwrap_or_else(|| format!("alert-{index}")),
        severity: severity(obj.get("severity")),
        kind: text(obj.get("type")).unwrap_or_else(|| "GENERAL".into()),
        message: text(obj.get("message")).unwrap_or_else(|| "No message".into()),
        borrower: text(first(obj, &["borrower", "borrower_address"])),
        chain: text(obj.get("chain")),
        token: text(obj.get("token")),
        health_factor: decimal(obj.get("health_factor")),
        collateral_usd: decimal(obj.get("collateral_usd")),
        action_required: text(obj.get("action_required")),
        timestamp: EventTime::parse(obj.get("timestamp")),
    })
}

pub fn normalize_signals(raw: &Value) -> Vec<RiskSignal> {
    normalize_list(raw, ResourceKind::RiskSignals, |obj, _| {
        let debt_usd = decimal(obj.get("debt_usd")).unwrap_or_default();
        let current_health_factor = if debt_usd <= Decimal::ZERO {
            HealthFactor::INFINITE
        } else {
            HealthFactor::from(decimal(first(obj, &["current_health_factor", "health_factor"])))
        };
        RiskSignal {
            borrower_address: text(first(obj, &["borrower_address", "borrower"]))
                .unwrap_or_default(),
            chain: text(obj.get("chain")).unwrap_or_default(),
            current_health_factor,
            borrower_ltv: ratio(first(obj, &["borrower_ltv", "ltv"])).unwrap_or_default(),
            liquidation_threshold: ratio(obj.get("liquidation_threshold")).unwrap_or_default(),
            urgency: severity(obj.get("urgency")),
            collateral_usd: decimal(obj.get("collateral_usd")).unwrap_or_default(),
            debt_usd,
            primary_collateral: text(obj.get("primary_collateral")),
            distance_to_liquidation: decimal(obj.get("distance_to_liquidation")),
            upstream_risk_category: text(obj.get("risk_category"))
                .as_deref()
                .and_then(RiskCategory::parse),
        }
    })
}

pub fn normalize_chain_comparison(raw: &Value) -> Vec<ChainComparison> {
    normalize_list(raw, ResourceKind::CrossChain, |obj, _| ChainComparison {
        chain: text(obj.get("chain")).unwrap_or_default(),
        average_health_factor: decimal(obj.get("average_health_factor")),
        debt_collateral_ratio: ratio(obj.get("debt_collateral_ratio")).unwrap_or_default(),
        total_positions: u64_field(obj.get("total_positions")).unwrap_or(0),
        total_collateral_usd: decimal(obj.get("total_collateral_usd")).unwrap_or_default(),
        total_debt_usd: decimal(obj.get("total_debt_usd")).unwrap_or_default(),
        liquidations_7d: u64_field(obj.get("liquidations_7d")).unwrap_or(0),
        top_collateral_tokens: strings(obj.get("top_collateral_tokens")),
        safety_score: decimal(obj.get("safety_score")).unwrap_or_default(),
    })
}

/// `{ chains: [...], details: [...] }` or a bare list of chain names.
pub fn normalize_available_chains(raw: &Value) -> AvailableChains {
    let chains = Envelope::detect(raw, ResourceKind::Chains)
        .records()
        .iter()
        .filter_map(|v| text(Some(v)))
        .collect();

    let details = raw
        .get("details")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| ChainDetail {
                    chain: text(obj.get("chain")).unwrap_or_default(),
                    reserve_count: u64_field(obj.get("reserve_count")).unwrap_or(0),
                    position_count: u64_field(obj.get("position_count")).unwrap_or(0),
                    last_reserve_update: EventTime::parse(obj.get("last_reserve_update")),
                })
                .collect()
        })
        .unwrap_or_default();

    AvailableChains { chains, details }
}

// ═══════════════════════════════════════════════════════════════════════════
// Object resources
// ═══════════════════════════════════════════════════════════════════════════

pub fn normalize_quick_stats(raw: &Value) -> QuickStats {
    let Some(obj) = object_payload(raw) else {
        return QuickStats::default();
    };

    QuickStats {
        positions: u64_field(first(obj, &["positions", "total_positions"])).unwrap_or(0),
        total_collateral_usd: decimal(obj.get("total_collateral_usd")).unwrap_or_default(),
        at_risk_positions: u64_field(obj.get("at_risk_positions")).unwrap_or(0),
        critical_positions: u64_field(obj.get("critical_positions")).unwrap_or(0),
        at_risk_percentage: ratio(obj.get("at_risk_percentage")),
        health_score: score(obj.get("health_score")).map(|s| s.score),
        timestamp: EventTime::parse(obj.get("timestamp")),
    }
}

pub fn normalize_risk_summary(raw: &Value) -> ProtocolRiskSummary {
    let Some(obj) = object_payload(raw) else {
        return ProtocolRiskSummary::default();
    };

    ProtocolRiskSummary {
        total_collateral_usd: decimal(obj.get("total_collateral_usd")).unwrap_or_default(),
        total_debt_usd: decimal(obj.get("total_debt_usd")).unwrap_or_default(),
        protocol_ltv: ratio(obj.get("protocol_ltv")).unwrap_or_default(),
        average_health_factor: decimal(obj.get("average_health_factor")),
        at_risk_value_usd: decimal(obj.get("at_risk_value_usd")).unwrap_or_default(),
        at_risk_percentage: ratio(obj.get("at_risk_percentage")),
        chains_analyzed: strings(obj.get("chains_analyzed")),
        timestamp: EventTime::parse(obj.get("timestamp")),
    }
}

pub fn normalize_protocol_health(raw: &Value) -> ProtocolHealth {
    let Some(obj) = object_payload(raw) else {
        return ProtocolHealth::default();
    };

    let position_insights = obj
        .get("position_insights")
        .and_then(Value::as_object)
        .map(|p| PositionInsights {
            total_positions: u64_field(p.get("total_positions")).unwrap_or(0),
            risky_positions: u64_field(p.get("risky_positions")).unwrap_or(0),
            critical_positions: u64_field(p.get("critical_positions")).unwrap_or(0),
            total_collateral_usd: decimal(p.get("total_collateral_usd")).unwrap_or_default(),
            total_debt_usd: decimal(p.get("total_debt_usd")).unwrap_or_default(),
            protocol_ltv: ratio(p.get("protocol_ltv")).unwrap_or_default(),
            avg_health_factor: decimal(first(p, &["avg_health_factor", "average_health_factor"])),
            risk_distribution: histogram(p.get("risk_distribution")),
        });

    let reserve_insights = obj
        .get("reserve_insights")
        .and_then(Value::as_object)
        .map(|r| ReserveInsights {
            total_reserves: u64_field(r.get("total_reserves")).unwrap_or(0),
            high_apy_reserves: u64_field(r.get("high_apy_reserves")).unwrap_or(0),
            frozen_reserves: u64_field(r.get("frozen_reserves")).unwrap_or(0),
            high_ltv_reserves: u64_field(r.get("high_ltv_reserves")).unwrap_or(0),
            avg_supply_apy: ratio(r.get("avg_supply_apy")).unwrap_or_default(),
            avg_borrow_apy: ratio(r.get("avg_borrow_apy")).unwrap_or_default(),
        });

    let liquidation_insights = obj
        .get("liquidation_insights")
        .and_then(Value::as_object)
        .map(|l| LiquidationInsights {
            liquidations_30d: u64_field(l.get("liquidations_30d")).unwrap_or(0),
            total_liquidated_usd: decimal(l.get("total_liquidated_usd")).unwrap_or_default(),
            avg_liquidation_size: decimal(l.get("avg_liquidation_size")).unwrap_or_default(),
            liquidation_rate_per_day: decimal(l.get("liquidation_rate_per_day"))
                .unwrap_or_default(),
        });

    let alerts = obj
        .get("alerts")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|a| ProtocolAlert {
                    severity: severity(a.get("severity")),
                    kind: text(a.get("type")).unwrap_or_else(|| "GENERAL".into()),
                    message: text(a.get("message")).unwrap_or_else(|| "No message".into()),
                    action: text(a.get("action")),
                })
                .collect()
        })
        .unwrap_or_default();

    ProtocolHealth {
        chains_analyzed: strings(obj.get("chains_analyzed")),
        position_insights,
        reserve_insights,
        liquidation_insights,
        health_score: score(obj.get("health_score")),
        alerts,
        timestamp: EventTime::parse(obj.get("timestamp")),
    }
}

pub fn normalize_liquidation_trends(raw: &Value) -> LiquidationTrends {
    let Some(obj) = object_payload(raw) else {
        return LiquidationTrends::default();
    };

    let top_liquidated_assets = obj
        .get("top_liquidated_assets")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|a| AssetCount {
                    asset: text(a.get("asset")).unwrap_or_default(),
                    count: u64_field(a.get("count")).unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    let chain_distribution = obj
        .get("chain_distribution")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|c| ChainShare {
                    chain: text(c.get("chain")).unwrap_or_default(),
                    count: u64_field(c.get("count")).unwrap_or(0),
                    share: ratio(c.get("percentage")).unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    LiquidationTrends {
        period_days: u64_field(obj.get("period_days")).unwrap_or(0) as u32,
        liquidations_24h: u64_field(obj.get("liquidations_24h")).unwrap_or(0),
        liquidations_7d: u64_field(obj.get("liquidations_7d")).unwrap_or(0),
        volume_usd_24h: decimal(obj.get("liquidation_volume_usd_24h")).unwrap_or_default(),
        volume_usd_7d: decimal(obj.get("liquidation_volume_usd_7d")).unwrap_or_default(),
        daily_average_7d: decimal(obj.get("daily_average_7d")).unwrap_or_default(),
        trend: text(obj.get("trend")).unwrap_or_else(|| "unknown".into()),
        top_liquidated_assets,
        chain_distribution,
    }
}

pub fn normalize_risky_borrowers(raw: &Value) -> RiskyBorrowersSummary {
    let Some(obj) = object_payload(raw) else {
        return RiskyBorrowersSummary::default();
    };

    let breakdown_by_chain = obj
        .get("breakdown_by_chain")
        .and_then(Value::as_object)
        .map(|chains| {
            chains
                .iter()
                .filter_map(|(chain, v)| {
                    let b = v.as_object()?;
                    Some((
                        chain.clone(),
                        ChainRiskBreakdown {
                            count: u64_field(b.get("count")).unwrap_or(0),
                            critical_count: u64_field(b.get("critical_count")).unwrap_or(0),
                            total_at_risk_usd: decimal(b.get("total_at_risk_usd"))
                                .unwrap_or_default(),
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    RiskyBorrowersSummary {
        threshold: decimal(obj.get("threshold")).unwrap_or_default(),
        total_risky_borrowers: u64_field(obj.get("total_risky_borrowers")).unwrap_or(0),
        breakdown_by_chain,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Field helpers
// ═══════════════════════════════════════════════════════════════════════════

/// First non-null value among alternative field names.
fn first<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Parse a number, or a number-as-string, into `Decimal`.
pub(crate) fn decimal(v: Option<&Value>) -> Option<Decimal> {
    match v? {
        Value::Number(n) => {
            let s = n.to_string();
            s.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&s))
                .ok()
                .or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}

/// Ratio in canonical fraction form: values above 1 are percentages.
pub(crate) fn ratio(v: Option<&Value>) -> Option<Decimal> {
    decimal(v).map(to_fraction)
}

pub(crate) fn to_fraction(value: Decimal) -> Decimal {
    if value > Decimal::ONE {
        value / dec!(100)
    } else {
        value
    }
}

/// Liquidation bonus as a premium fraction.
fn bonus(v: Option<&Value>) -> Option<Decimal> {
    let value = decimal(v)?;
    let premium = if value <= Decimal::ONE {
        value
    } else if value <= dec!(2) {
        value - Decimal::ONE
    } else if value >= dec!(100) {
        (value - dec!(100)) / dec!(100)
    } else {
        value / dec!(100)
    };
    Some(premium.max(Decimal::ZERO))
}

fn text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn strings(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items.iter().filter_map(|i| text(Some(i))).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn u64_field(v: Option<&Value>) -> Option<u64> {
    match v? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(v: Option<&Value>, default: bool) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().map_or(default, |i| i != 0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Unknown or missing severities default to `MEDIUM`.
fn severity(v: Option<&Value>) -> Severity {
    text(v)
        .as_deref()
        .and_then(Severity::parse)
        .unwrap_or(Severity::Medium)
}

/// Health score as a bare number or `{ score, status, description }`.
fn score(v: Option<&Value>) -> Option<UpstreamHealthScore> {
    match v? {
        Value::Object(obj) => Some(UpstreamHealthScore {
            score: decimal(obj.get("score"))?,
            status: text(obj.get("status")),
            description: text(obj.get("description")),
        }),
        other => Some(UpstreamHealthScore {
            score: decimal(Some(other))?,
            status: None,
            description: None,
        }),
    }
}

/// Category histogram; `None` when no key names a known category.
fn histogram(v: Option<&Value>) -> Option<BTreeMap<RiskCategory, u64>> {
    let obj = v?.as_object()?;
    let mut counts = BTreeMap::new();
    for (key, count) in obj {
        if let Some(category) = RiskCategory::parse(key) {
            *counts.entry(category).or_insert(0) += u64_field(Some(count)).unwrap_or(0);
        }
    }
    if counts.is_empty() {
        None
    } else {
        Some(counts)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_positions() -> Value {
        json!([
            {
                "borrower_address": "0x1111111111111111111111111111111111111111",
                "chain": "ethereum",
                "token_symbol": "WETH",
                "collateral_usd": 10000,
                "debt_usd": "7500.5",
                "enhanced_health_factor": 1.05,
                "risk_category": "CRITICAL",
                "last_updated": "2024-05-01T10:00:00Z"
            },
            {
                "borrower_address": "0x2222222222222222222222222222222222222222",
                "chain": "polygon",
                "token_symbol": "USDC",
                "collateral_usd": 500,
                "debt_usd": 0,
                "health_factor": 0
            }
        ])
    }

    // -----------------------------------------------------------------------
    // Envelopes
    // -----------------------------------------------------------------------

    #[test]
    fn test_three_envelopes_normalize_identically() {
        let items = sample_positions();
        let bare = normalize_positions(&items, ResourceKind::Positions);
        let keyed = normalize_positions(&json!({ "positions": items }), ResourceKind::Positions);
        let data = normalize_positions(&json!({ "data": items }), ResourceKind::Positions);

        assert_eq!(bare.len(), 2);
        assert_eq!(bare, keyed);
        assert_eq!(bare, data);
    }

    #[test]
    fn test_unrecognized_shapes_are_empty() {
        for raw in [
            json!(null),
            json!(42),
            json!("positions"),
            json!({ "positions": "not a list" }),
            json!({ "data": { "positions": [] } }),
            json!({ "something_else": [1, 2, 3] }),
        ] {
            assert!(normalize_positions(&raw, ResourceKind::Positions).is_empty(), "{raw}");
            assert_eq!(Envelope::detect(&raw, ResourceKind::Positions), Envelope::Unrecognized);
        }
    }

    #[test]
    fn test_keyed_envelope_takes_precedence_over_data() {
        let raw = json!({ "reserves": [{ "token_symbol": "DAI" }], "data": [] });
        assert!(matches!(
            Envelope::detect(&raw, ResourceKind::Reserves),
            Envelope::Keyed(items) if items.len() == 1
        ));
    }

    #[test]
    fn test_non_object_records_are_dropped_but_sparse_objects_kept() {
        let raw = json!([1, "x", null, {}, { "chain": "base" }]);
        let positions = normalize_positions(&raw, ResourceKind::Positions);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].collateral_usd, Decimal::ZERO);
        assert_eq!(positions[1].chain, "base");
    }

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    #[test]
    fn test_position_fields() {
        let positions = normalize_positions(&sample_positions(), ResourceKind::Positions);
        let p = &positions[0];
        assert_eq!(p.debt_usd, dec!(7500.5));
        assert_eq!(p.collateral_usd, dec!(10000));
        assert_eq!(p.health_factor.value(), Some(dec!(1.05)));
        assert_eq!(p.upstream_risk_category, Some(RiskCategory::Critical));
        assert!(p.last_updated.is_known());
        assert_eq!(p.token_address, None);
    }

    #[test]
    fn test_zero_debt_forces_infinite_health_factor() {
        let raw = json!([{ "debt_usd": 0, "enhanced_health_factor": 1.2 }]);
        let positions = normalize_positions(&raw, ResourceKind::Positions);
        assert!(positions[0].health_factor.is_infinite());
    }

    #[test]
    fn test_legacy_field_names() {
        let raw = json!([{
            "borrower": "0xabc",
            "totalcollateralusd": 300,
            "totaldebtusd": 100,
            "lowesthealthfactor": 2.4
        }]);
        let p = &normalize_positions(&raw, ResourceKind::Positions)[0];
        assert_eq!(p.borrower_address, "0xabc");
        assert_eq!(p.debt_usd, dec!(100));
        assert_eq!(p.health_factor.value(), Some(dec!(2.4)));
    }

    #[test]
    fn test_page_info_nested_and_flat() {
        let risky = json!({
            "positions": [],
            "pagination": { "page": 2, "page_size": 50, "total_items": 120, "total_pages": 3, "has_next": true, "has_prev": true }
        });
        let info = normalize_page_info(&risky).unwrap();
        assert_eq!((info.page, info.total_pages, info.total_items), (2, 3, 120));
        assert!(info.has_next);

        let summary = json!({ "positions": [], "page": 1, "page_size": 100, "total_positions": 40, "total_pages": 1 });
        let info = normalize_page_info(&summary).unwrap();
        assert_eq!(info.total_items, 40);
        assert!(!info.has_next);

        assert_eq!(normalize_page_info(&json!([])), None);
    }

    // -----------------------------------------------------------------------
    // Reserves
    // -----------------------------------------------------------------------

    #[test]
    fn test_reserve_ratios_are_fractions() {
        let raw = json!({ "reserves": [
            { "token_symbol": "WETH", "ltv": 0.8, "liquidation_threshold": 82.5, "liquidation_bonus": 1.05, "supply_apy": 2.5, "is_frozen": "false" },
            { "token_symbol": "DAI", "ltv": 75, "liquidation_threshold": 0.8, "liquidation_bonus": 105, "borrow_apy": 0.04 },
            { "token_symbol": "LINK", "liquidation_bonus": 7.5 }
        ]});
        let reserves = normalize_reserves(&raw);

        assert_eq!(reserves[0].ltv, dec!(0.8));
        assert_eq!(reserves[0].liquidation_threshold, dec!(0.825));
        assert_eq!(reserves[0].liquidation_bonus, dec!(0.05));
        assert_eq!(reserves[0].supply_apy, Some(dec!(0.025)));
        assert!(!reserves[0].is_frozen);
        assert!(reserves[0].is_active, "missing flag defaults to active");

        assert_eq!(reserves[1].ltv, dec!(0.75));
        assert_eq!(reserves[1].liquidation_bonus, dec!(0.05));
        assert_eq!(reserves[1].borrow_apy, Some(dec!(0.04)));
        assert_eq!(reserves[1].supply_apy, None);

        assert_eq!(reserves[2].liquidation_bonus, dec!(0.075));
        assert_eq!(reserves[2].ltv, Decimal::ZERO);
        assert_eq!(reserves[2].query_time, EventTime::Unknown);
    }

    // -----------------------------------------------------------------------
    // Liquidations and alerts
    // -----------------------------------------------------------------------

    #[test]
    fn test_liquidation_fallback_fields_and_bad_dates() {
        let raw = json!([
            { "id": 7, "liquidated_collateral_usd": 1200, "liquidation_date": "garbage" },
            { "collateral_seized_usd": 50, "debt_repaid_usd": "45.5", "liquidation_date": "2024-02-01 09:15:00" }
        ]);
        let events = normalize_liquidations(&raw);

        assert_eq!(events[0].id, "7");
        assert_eq!(events[0].collateral_seized_usd, dec!(1200));
        assert_eq!(events[0].debt_repaid_usd, None);
        assert_eq!(events[0].liquidation_date, EventTime::Unknown);

        assert_eq!(events[1].id, "1");
        assert_eq!(events[1].debt_repaid_usd, Some(dec!(45.5)));
        assert!(events[1].liquidation_date.is_known());
    }

    #[test]
    fn test_alert_defaults() {
        let raw = json!({ "alerts": [
            {},
            { "alert_id": "a-1", "severity": "critical", "type": "LIQUIDATION_RISK", "message": "HF below 1.05", "borrower_address": "0xdef", "timestamp": "2024-01-01T00:00:00Z" }
        ]});
        let alerts = normalize_alerts(&raw);

        assert_eq!(alerts[0].id, "alert-0");
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert_eq!(alerts[0].kind, "GENERAL");
        assert_eq!(alerts[0].message, "No message");
        assert_eq!(alerts[0].timestamp, EventTime::Unknown);

        assert_eq!(alerts[1].id, "a-1");
        assert_eq!(alerts[1].severity, Severity::Critical);
        assert_eq!(alerts[1].borrower.as_deref(), Some("0xdef"));
    }

    #[test]
    fn test_signals() {
        let raw = json!({ "threshold": 1.5, "signals": [
            { "borrower_address": "0xabc", "current_health_factor": 1.08, "borrower_ltv": 78, "liquidation_threshold": 0.825, "urgency": "HIGH", "collateral_usd": 1000, "debt_usd": 780 }
        ]});
        let signals = normalize_signals(&raw);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].borrower_ltv, dec!(0.78));
        assert_eq!(signals[0].urgency, Severity::High);
        assert_eq!(signals[0].current_health_factor.value(), Some(dec!(1.08)));
    }

    // -----------------------------------------------------------------------
    // Object resources
    // -----------------------------------------------------------------------

    #[test]
    fn test_quick_stats_percentage_scale() {
        let stats = normalize_quick_stats(&json!({ "at_risk_percentage": 15, "positions": 1200 }));
        assert_eq!(stats.at_risk_percentage, Some(dec!(0.15)));
        assert_eq!(stats.positions, 1200);
        assert_eq!(stats.health_score, None);

        let stats = normalize_quick_stats(&json!({ "data": { "at_risk_percentage": 0.15 } }));
        assert_eq!(stats.at_risk_percentage, Some(dec!(0.15)));

        assert_eq!(normalize_quick_stats(&json!([1, 2])), QuickStats::default());
    }

    #[test]
    fn test_protocol_health_nested() {
        let raw = json!({
            "chains_analyzed": ["ethereum", "base"],
            "position_insights": {
                "total_positions": 10,
                "protocol_ltv": 45,
                "avg_health_factor": 2.1,
                "risk_distribution": { "SAFE": 6, "LOW_RISK": 2, "CRITICAL": 1, "HIGHRISK": 1, "bogus": 9 }
            },
            "health_score": { "score": 72, "status": "GOOD", "description": "Stable" },
            "alerts": [{ "severity": "HIGH", "type": "CONCENTRATION", "message": "Top borrower > 20%" }]
        });
        let health = normalize_protocol_health(&raw);
        let insights = health.position_insights.unwrap();
        assert_eq!(insights.protocol_ltv, dec!(0.45));
        let dist = insights.risk_distribution.unwrap();
        assert_eq!(dist[&RiskCategory::Safe], 6);
        assert_eq!(dist[&RiskCategory::HighRisk], 1);
        assert_eq!(dist.len(), 4);

        let score = health.health_score.unwrap();
        assert_eq!(score.score, dec!(72));
        assert_eq!(score.status.as_deref(), Some("GOOD"));
        assert_eq!(health.alerts[0].severity, Severity::High);
        assert_eq!(health.chains_analyzed.len(), 2);
        assert!(health.reserve_insights.is_none());
    }

    #[test]
    fn test_liquidation_trends() {
        let raw = json!({
            "period_days": 7,
            "liquidations_7d": 14,
            "liquidation_volume_usd_7d": 250000.75,
            "trend": "increasing",
            "top_liquidated_assets": [{ "asset": "WETH", "count": 9 }],
            "chain_distribution": [{ "chain": "ethereum", "count": 10, "percentage": 71.4 }]
        });
        let trends = normalize_liquidation_trends(&raw);
        assert_eq!(trends.liquidations_7d, 14);
        assert_eq!(trends.volume_usd_7d, dec!(250000.75));
        assert_eq!(trends.top_liquidated_assets[0].count, 9);
        assert_eq!(trends.chain_distribution[0].share, dec!(0.714));
    }

    #[test]
    fn test_available_chains_both_shapes() {
        let keyed = normalize_available_chains(&json!({
            "chains": ["ethereum", "arbitrum"],
            "details": [{ "chain": "ethereum", "reserve_count": 30, "position_count": 900, "last_reserve_update": "bad" }]
        }));
        assert_eq!(keyed.chains, vec!["ethereum", "arbitrum"]);
        assert_eq!(keyed.details[0].last_reserve_update, EventTime::Unknown);

        let bare = normalize_available_chains(&json!(["base"]));
        assert_eq!(bare.chains, vec!["base"]);
        assert!(bare.details.is_empty());
    }

    #[test]
    fn test_risky_borrowers() {
        let summary = normalize_risky_borrowers(&json!({
            "threshold": 1.5,
            "total_risky_borrowers": 3,
            "breakdown_by_chain": { "ethereum": { "count": 3, "critical_count": 1, "total_at_risk_usd": 9000 } }
        }));
        assert_eq!(summary.total_risky_borrowers, 3);
        assert_eq!(summary.breakdown_by_chain["ethereum"].critical_count, 1);
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    #[test]
    fn test_decimal_parsing() {
        assert_eq!(decimal(Some(&json!("123.456"))), Some(dec!(123.456)));
        assert_eq!(decimal(Some(&json!(42.5))), Some(dec!(42.5)));
        assert_eq!(decimal(Some(&json!(1e-7))), Some(dec!(0.0000001)));
        assert_eq!(decimal(Some(&json!("n/a"))), None);
        assert_eq!(decimal(Some(&json!(null))), None);
        assert_eq!(decimal(None), None);
    }

    #[test]
    fn test_to_fraction_boundary() {
        assert_eq!(to_fraction(dec!(1)), dec!(1));
        assert_eq!(to_fraction(dec!(1.5)), dec!(0.015));
        assert_eq!(to_fraction(dec!(0.5)), dec!(0.5));
    }
}
