//! Protocol aggregator: folds the overview inputs into summary figures,
//! gauge readings and a risk histogram.
//!
//! Every input is optional and any subset may be missing; what is missing
//! degrades to zero or an empty histogram. Nothing here performs I/O.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::classifier::classify;
use crate::constants::{AVG_HF_GAUGE_SCALE, GAUGE_MAX};
use crate::types::{
    DistributionSource, Gauges, Position, ProtocolHealth, ProtocolRiskSummary, ProtocolSummary,
    QuickStats, RiskCategory, RiskDistribution,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OverviewInputs<'a> {
    pub quick_stats: Option<&'a QuickStats>,
    pub protocol_health: Option<&'a ProtocolHealth>,
    pub risk_summary: Option<&'a ProtocolRiskSummary>,
    /// Only consulted when upstream sent no histogram.
    pub positions_sample: Option<&'a [Position]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub summary: ProtocolSummary,
    pub gauges: Gauges,
    pub distribution: RiskDistribution,
    pub distribution_source: DistributionSource,
}

pub fn aggregate(inputs: &OverviewInputs<'_>) -> Aggregate {
    let summary = summarize(inputs);
    let gauges = Gauges {
        health_score: summary.health_score,
        ltv_percent: ltv_gauge(summary.protocol_ltv),
        average_health_factor: avg_hf_gauge(summary.average_health_factor),
    };
    let (distribution, distribution_source) = distribution(inputs);

    Aggregate {
        summary,
        gauges,
        distribution,
        distribution_source,
    }
}

/// Whether an overview has to fetch a positions sample to build its histogram.
pub fn needs_positions_sample(protocol_health: Option<&ProtocolHealth>) -> bool {
    upstream_histogram(protocol_health).is_none()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

fn summarize(inputs: &OverviewInputs<'_>) -> ProtocolSummary {
    let summary = inputs.risk_summary;
    let insights = inputs
        .protocol_health
        .and_then(|h| h.position_insights.as_ref());

    let total_collateral_usd = first_nonzero([
        summary.map(|s| s.total_collateral_usd),
        insights.map(|i| i.total_collateral_usd),
        inputs.quick_stats.map(|q| q.total_collateral_usd),
    ]);
    let total_debt_usd = first_nonzero([
        summary.map(|s| s.total_debt_usd),
        insights.map(|i| i.total_debt_usd),
    ]);

    let computed_ltv = (total_collateral_usd > Decimal::ZERO)
        .then(|| total_debt_usd / total_collateral_usd);
    let protocol_ltv = first_nonzero([
        summary.map(|s| s.protocol_ltv),
        insights.map(|i| i.protocol_ltv),
        computed_ltv,
    ]);

    let average_health_factor = summary
        .and_then(|s| s.average_health_factor)
        .or_else(|| insights.and_then(|i| i.avg_health_factor))
        .or_else(|| inputs.positions_sample.and_then(sample_average_health_factor));

    let at_risk_percentage = at_risk_fraction(inputs);

    ProtocolSummary {
        total_collateral_usd,
        total_debt_usd,
        protocol_ltv,
        average_health_factor,
        at_risk_value_usd: summary.map(|s| s.at_risk_value_usd).unwrap_or_default(),
        at_risk_percentage: at_risk_percentage.unwrap_or_default(),
        health_score: health_score(inputs),
    }
}

fn first_nonzero<const N: usize>(candidates: [Option<Decimal>; N]) -> Decimal {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.is_zero())
        .unwrap_or_default()
}

/// Share of positions at risk, as a fraction.
fn at_risk_fraction(inputs: &OverviewInputs<'_>) -> Option<Decimal> {
    inputs
        .quick_stats
        .and_then(|q| q.at_risk_percentage)
        .or_else(|| inputs.risk_summary.and_then(|s| s.at_risk_percentage))
}

fn sample_average_health_factor(positions: &[Position]) -> Option<Decimal> {
    let finite: Vec<Decimal> = positions
        .iter()
        .filter_map(|p| p.health_factor.value())
        .collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<Decimal>() / Decimal::from(finite.len()))
}

// ---------------------------------------------------------------------------
// Health score and gauges
// ---------------------------------------------------------------------------

/// Upstream score when one was sent, otherwise `100 − at-risk %`.
pub fn health_score(inputs: &OverviewInputs<'_>) -> Decimal {
    let upstream = inputs
        .protocol_health
        .and_then(|h| h.health_score.as_ref())
        .map(|s| s.score)
        .or_else(|| inputs.quick_stats.and_then(|q| q.health_score));

    let score = match upstream {
        Some(score) => score,
        None => match at_risk_fraction(inputs) {
            Some(fraction) => GAUGE_MAX - fraction * GAUGE_MAX,
            None => return Decimal::ZERO,
        },
    };
    clamp_gauge(score)
}

/// Protocol LTV fraction → 0–100 gauge.
pub fn ltv_gauge(ltv: Decimal) -> Decimal {
    clamp_gauge(ltv * GAUGE_MAX)
}

/// Average health factor × 20, saturating at 100 (HF ≥ 5).
pub fn avg_hf_gauge(average_health_factor: Option<Decimal>) -> Decimal {
    average_health_factor.map_or(Decimal::ZERO, |hf| clamp_gauge(hf * AVG_HF_GAUGE_SCALE))
}

fn clamp_gauge(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, GAUGE_MAX)
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

fn upstream_histogram(
    protocol_health: Option<&ProtocolHealth>,
) -> Option<&BTreeMap<RiskCategory, u64>> {
    protocol_health?
        .position_insights
        .as_ref()?
        .risk_distribution
        .as_ref()
}

fn distribution(inputs: &OverviewInputs<'_>) -> (RiskDistribution, DistributionSource) {
    if let Some(histogram) = upstream_histogram(inputs.protocol_health) {
        let mut dist = RiskDistribution::default();
        for (category, count) in histogram {
            dist.add(*category, *count);
        }
        return (dist, DistributionSource::Upstream);
    }

    match inputs.positions_sample {
        Some(sample) if !sample.is_empty() => {
            let dist = sample.iter().map(|p| classify(p.health_factor)).collect();
            (dist, DistributionSource::Sampled)
        }
        _ => (RiskDistribution::default(), DistributionSource::Empty),
    }
}
