use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::risk::RiskCategory;

/// Protocol-level figures derived from the overview inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProtocolSummary {
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
    /// Fraction (0–1).
    #[serde(with = "rust_decimal::serde::str")]
    pub at_risk_percentage: Decimal,
    /// 0–100.
    #[serde(with = "rust_decimal::serde::str")]
    pub health_score: Decimal,
}

/// Gauge readings, all on a 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Gauges {
    #[serde(with = "rust_decimal::serde::str")]
    pub health_score: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ltv_percent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub average_health_factor: Decimal,
}

/// Where a risk histogram came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionSource {
    Upstream,
    Sampled,
    #[default]
    Empty,
}

/// Position count per risk category. Every category is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RiskDistribution(BTreeMap<RiskCategory, u64>);

impl Default for RiskDistribution {
    fn default() -> Self {
        Self(RiskCategory::ALL.iter().map(|c| (*c, 0)).collect())
    }
}

impl RiskDistribution {
    pub fn increment(&mut self, category: RiskCategory) {
        *self.0.entry(category).or_insert(0) += 1;
    }

    pub fn add(&mut self, category: RiskCategory, count: u64) {
        *self.0.entry(category).or_insert(0) += count;
    }

    pub fn count(&self, category: RiskCategory) -> u64 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Categories from most to least severe with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (RiskCategory, u64)> + '_ {
        self.0.iter().map(|(c, n)| (*c, *n))
    }
}

impl FromIterator<RiskCategory> for RiskDistribution {
    fn from_iter<I: IntoIterator<Item = RiskCategory>>(iter: I) -> Self {
        let mut dist = Self::default();
        for category in iter {
            dist.increment(category);
        }
        dist
    }
}

/// Freshness of one overview input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    Fresh,
    Stale,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverviewFreshness {
    pub quick_stats: FetchState,
    pub protocol_health: FetchState,
    pub risk_summary: FetchState,
    /// `None` when no positions sample was needed.
    pub positions_sample: Option<FetchState>,
}

impl OverviewFreshness {
    pub fn is_degraded(&self) -> bool {
        [self.quick_stats, self.protocol_health, self.risk_summary]
            .into_iter()
            .chain(self.positions_sample)
            .any(|s| s != FetchState::Fresh)
    }
}

/// Everything an overview view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub summary: ProtocolSummary,
    pub gauges: Gauges,
    pub distribution: RiskDistribution,
    pub distribution_source: DistributionSource,
    pub freshness: OverviewFreshness,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_distribution_has_every_category() {
        let dist = RiskDistribution::default();
        assert_eq!(dist.iter().count(), RiskCategory::ALL.len());
        assert!(dist.is_empty());
    }

    #[test]
    fn test_distribution_from_iter() {
        let dist: RiskDistribution = [RiskCategory::Safe, RiskCategory::Safe, RiskCategory::Critical]
            .into_iter()
            .collect();
        assert_eq!(dist.count(RiskCategory::Safe), 2);
        assert_eq!(dist.count(RiskCategory::Critical), 1);
        assert_eq!(dist.count(RiskCategory::LowRisk), 0);
        assert_eq!(dist.total(), 3);
    }

    #[test]
    fn test_freshness_degraded() {
        let mut freshness = OverviewFreshness {
            quick_stats: FetchState::Fresh,
            protocol_health: FetchState::Fresh,
            risk_summary: FetchState::Fresh,
            positions_sample: None,
        };
        assert!(!freshness.is_degraded());
        freshness.positions_sample = Some(FetchState::Unavailable);
        assert!(freshness.is_degraded());
    }
}
