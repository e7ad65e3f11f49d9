use std::cmp::Ordering;
use std::fmt;

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::constants::HF_INFINITE_CUTOFF;

// ---------------------------------------------------------------------------
// Health factor
// ---------------------------------------------------------------------------

/// A borrower's health factor. `None` inside means infinite: no debt, or a
/// value upstream could only express as zero, NaN, infinity or an absurdly
/// large number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HealthFactor(#[serde(with = "rust_decimal::serde::str_option")] Option<Decimal>);

impl HealthFactor {
    pub const INFINITE: Self = Self(None);

    /// Zero and values above the infinity cutoff are treated as infinite.
    /// Negative values are kept: they sit below the liquidation line.
    pub fn new(value: Decimal) -> Self {
        if value.is_zero() || value > HF_INFINITE_CUTOFF {
            Self::INFINITE
        } else {
            Self(Some(value))
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        self.0
    }

    pub fn is_infinite(&self) -> bool {
        self.0.is_none()
    }
}

impl Default for HealthFactor {
    fn default() -> Self {
        Self::INFINITE
    }
}

impl From<Decimal> for HealthFactor {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<f64> for HealthFactor {
    fn from(value: f64) -> Self {
        if !value.is_finite() {
            return Self::INFINITE;
        }
        Decimal::from_f64(value).map_or(Self::INFINITE, Self::new)
    }
}

impl From<Option<Decimal>> for HealthFactor {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Self::INFINITE, Self::new)
    }
}

impl PartialOrd for HealthFactor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HealthFactor {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(&b),
        }
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.4}", v),
            None => f.write_str("∞"),
        }
    }
}

// ---------------------------------------------------------------------------
// Risk category
// ---------------------------------------------------------------------------

/// Risk band of a health factor, most severe first.
///
/// The derived ordering runs from most to least severe, so a higher health
/// factor never maps to a smaller variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    /// HF < 1.0
    LiquidationImminent,
    /// 1.0 ≤ HF < 1.1
    Critical,
    /// 1.1 ≤ HF < 1.3
    HighRisk,
    /// 1.3 ≤ HF < 1.5
    MediumRisk,
    /// 1.5 ≤ HF < 2.0
    LowRisk,
    /// HF ≥ 2.0, or no debt.
    Safe,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 6] = [
        Self::LiquidationImminent,
        Self::Critical,
        Self::HighRisk,
        Self::MediumRisk,
        Self::LowRisk,
        Self::Safe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LiquidationImminent => "LIQUIDATION_IMMINENT",
            Self::Critical => "CRITICAL",
            Self::HighRisk => "HIGH_RISK",
            Self::MediumRisk => "MEDIUM_RISK",
            Self::LowRisk => "LOW_RISK",
            Self::Safe => "SAFE",
        }
    }

    /// 5 for the most severe band down to 0 for `Safe`.
    pub fn severity(&self) -> u8 {
        match self {
            Self::LiquidationImminent => 5,
            Self::Critical => 4,
            Self::HighRisk => 3,
            Self::MediumRisk => 2,
            Self::LowRisk => 1,
            Self::Safe => 0,
        }
    }

    pub fn color(&self) -> RiskColor {
        match self {
            Self::LiquidationImminent => RiskColor::DarkRed,
            Self::Critical => RiskColor::Red,
            Self::HighRisk => RiskColor::Orange,
            Self::MediumRisk => RiskColor::Yellow,
            Self::LowRisk => RiskColor::Blue,
            Self::Safe => RiskColor::Green,
        }
    }

    /// Lenient parse of upstream spellings: `HIGH_RISK`, `HIGHRISK`,
    /// `high-risk` and `HIGH` all map to [`RiskCategory::HighRisk`].
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "LIQUIDATIONIMMINENT" | "LIQUIDATION" | "IMMINENT" => Some(Self::LiquidationImminent),
            "CRITICAL" => Some(Self::Critical),
            "HIGHRISK" | "HIGH" => Some(Self::HighRisk),
            "MEDIUMRISK" | "MEDIUM" => Some(Self::MediumRisk),
            "LOWRISK" | "LOW" => Some(Self::LowRisk),
            "SAFE" | "HEALTHY" => Some(Self::Safe),
            _ => None,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display color paired with each [`RiskCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskColor {
    Green,
    Blue,
    Yellow,
    Orange,
    Red,
    DarkRed,
}

/// A record annotated with the risk band of its health factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classified<T> {
    #[serde(flatten)]
    pub record: T,
    pub risk_category: RiskCategory,
    pub risk_color: RiskColor,
}

/// Coarse shape of a borrowing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionType {
    SupplyOnly,
    OverCollateralized,
    AtRisk,
    Moderate,
    Healthy,
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordered severity tier shared by risk alerts and borrower risk-signal urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" | "INFO" => Some(Self::Low),
            "MEDIUM" | "MODERATE" | "WARNING" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" | "URGENT" | "IMMEDIATE" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_health_factor_sentinels() {
        assert!(HealthFactor::new(Decimal::ZERO).is_infinite());
        assert_eq!(HealthFactor::new(dec!(-1)).value(), Some(dec!(-1)));
        assert!(HealthFactor::new(dec!(1000.5)).is_infinite());
        assert!(HealthFactor::from(f64::NAN).is_infinite());
        assert!(HealthFactor::from(f64::INFINITY).is_infinite());
        assert!(HealthFactor::from(1e40).is_infinite());
        assert_eq!(HealthFactor::from(1.25).value(), Some(dec!(1.25)));
    }

    #[test]
    fn test_health_factor_ordering_puts_infinite_last() {
        let mut hfs = vec![
            HealthFactor::INFINITE,
            HealthFactor::new(dec!(1.2)),
            HealthFactor::new(dec!(0.9)),
        ];
        hfs.sort();
        assert_eq!(hfs[0].value(), Some(dec!(0.9)));
        assert!(hfs[2].is_infinite());
    }

    #[test]
    fn test_health_factor_display() {
        assert_eq!(HealthFactor::new(dec!(1.5)).to_string(), "1.5000");
        assert_eq!(HealthFactor::INFINITE.to_string(), "∞");
    }

    #[test]
    fn test_category_parse_variants() {
        assert_eq!(RiskCategory::parse("HIGH_RISK"), Some(RiskCategory::HighRisk));
        assert_eq!(RiskCategory::parse("HIGHRISK"), Some(RiskCategory::HighRisk));
        assert_eq!(RiskCategory::parse("liquidation-imminent"), Some(RiskCategory::LiquidationImminent));
        assert_eq!(RiskCategory::parse("LOWRISK"), Some(RiskCategory::LowRisk));
        assert_eq!(RiskCategory::parse("unknown"), None);
    }

    #[test]
    fn test_category_order_is_severity_descending() {
        for pair in RiskCategory::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].severity() > pair[1].severity());
        }
    }

    #[test]
    fn test_category_serializes_screaming_snake() {
        let json = serde_json::to_string(&RiskCategory::LiquidationImminent).unwrap();
        assert_eq!(json, "\"LIQUIDATION_IMMINENT\"");
        assert_eq!(RiskCategory::MediumRisk.to_string(), "MEDIUM_RISK");
    }

    #[test]
    fn test_severity_parse_and_order() {
        assert_eq!(Severity::parse("critical"), Some(Severity::Critical));
        assert_eq!(Severity::parse(" High "), Some(Severity::High));
        assert_eq!(Severity::parse("???"), None);
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low < Severity::Medium);
    }
}
