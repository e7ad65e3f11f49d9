use rust_decimal::Decimal;
use serde::Serialize;

use super::time::EventTime;

/// A lending-market asset and its risk parameters.
///
/// Every ratio is a fraction (0–1). `liquidation_bonus` is the premium a
/// liquidator receives, so a 5% bonus is `0.05` regardless of whether upstream
/// sent `1.05`, `5` or `0.05`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reserve {
    pub chain: String,
    pub token_symbol: String,
    pub token_address: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub ltv: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidation_threshold: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidation_bonus: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub supply_apy: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub borrow_apy: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_usd: Decimal,
    pub is_active: bool,
    pub is_frozen: bool,
    pub borrowing_enabled: bool,
    pub query_time: EventTime,
}

/// Exposure-weighted risk view of a single reserve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReserveRiskMetric {
    pub chain: String,
    pub token_symbol: String,
    pub token_address: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub utilization_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ltv: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidation_threshold: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidation_bonus: Decimal,
    pub is_frozen: bool,
    pub borrowing_enabled: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_exposure_usd: Decimal,
    pub position_count: u64,
    /// Share of exposure held by the largest borrower (fraction).
    #[serde(with = "rust_decimal::serde::str")]
    pub top_borrower_exposure: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub risk_score: Decimal,
    pub risk_level: String,
}
