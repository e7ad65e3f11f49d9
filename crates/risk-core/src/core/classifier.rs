//! Health factor → risk category mapping.
//!
//! Bands are half-open and checked from the most severe down, so every
//! health factor lands in exactly one category. Zero, NaN, infinity and
//! debt-free positions all arrive here as [`HealthFactor::INFINITE`] and map
//! to [`RiskCategory::Safe`]. Negative values fall below the liquidation line.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::{
    HF_CRITICAL_MAX, HF_HIGH_RISK_MAX, HF_LIQUIDATION, HF_LOW_RISK_MAX, HF_MEDIUM_RISK_MAX,
};
use crate::types::{
    Classified, HealthFactor, Position, PositionType, RiskCategory, RiskColor, RiskSignal,
};

/// Classify any health-factor-like value.
pub fn classify(health_factor: impl Into<HealthFactor>) -> RiskCategory {
    let hf = match health_factor.into().value() {
        Some(v) => v,
        None => return RiskCategory::Safe,
    };

    if hf < HF_LIQUIDATION {
        RiskCategory::LiquidationImminent
    } else if hf < HF_CRITICAL_MAX {
        RiskCategory::Critical
    } else if hf < HF_HIGH_RISK_MAX {
        RiskCategory::HighRisk
    } else if hf < HF_MEDIUM_RISK_MAX {
        RiskCategory::MediumRisk
    } else if hf < HF_LOW_RISK_MAX {
        RiskCategory::LowRisk
    } else {
        RiskCategory::Safe
    }
}

pub fn risk_color(health_factor: impl Into<HealthFactor>) -> RiskColor {
    classify(health_factor).color()
}

/// Records that carry a health factor and can be classified.
pub trait HasHealthFactor {
    fn health_factor(&self) -> HealthFactor;
}

impl HasHealthFactor for Position {
    fn health_factor(&self) -> HealthFactor {
        self.health_factor
    }
}

impl HasHealthFactor for RiskSignal {
    fn health_factor(&self) -> HealthFactor {
        self.current_health_factor
    }
}

/// Attach category and color to a record without touching it.
pub fn annotate<T: HasHealthFactor>(record: T) -> Classified<T> {
    let category = classify(record.health_factor());
    Classified {
        record,
        risk_category: category,
        risk_color: category.color(),
    }
}

pub fn annotate_all<T: HasHealthFactor>(records: Vec<T>) -> Vec<Classified<T>> {
    records.into_iter().map(annotate).collect()
}

/// Coarse position shape used by borrower profile views.
pub fn classify_position_type(debt_usd: Decimal, health_factor: HealthFactor) -> PositionType {
    if debt_usd <= Decimal::ZERO {
        return PositionType::SupplyOnly;
    }
    match health_factor.value() {
        None => PositionType::OverCollateralized,
        Some(hf) if hf < dec!(1.05) => PositionType::AtRisk,
        Some(hf) if hf < dec!(1.3) => PositionType::Moderate,
        Some(_) => PositionType::Healthy,
    }
}
