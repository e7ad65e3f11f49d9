use rust_decimal::Decimal;
use serde::Serialize;

use super::risk::{Classified, HealthFactor, RiskCategory, Severity};
use super::time::EventTime;

/// A borrower's collateral/debt position in one asset on one chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub borrower_address: String,
    pub chain: String,
    pub token_symbol: String,
    pub token_address: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub collateral_amount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub debt_amount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub collateral_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub debt_usd: Decimal,
    /// Supplied by upstream; infinite whenever `debt_usd` is zero.
    pub health_factor: HealthFactor,
    /// Category upstream attached to the record, if any.
    pub upstream_risk_category: Option<RiskCategory>,
    pub last_updated: EventTime,
}

/// Upstream pagination metadata for the paginated position endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One upstream page of classified positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PositionPage {
    pub positions: Vec<Classified<Position>>,
    pub page_info: Option<PageInfo>,
}

/// Borrower-level early-warning signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSignal {
    pub borrower_address: String,
    pub chain: String,
    pub current_health_factor: HealthFactor,
    /// Fraction (0–1).
    #[serde(with = "rust_decimal::serde::str")]
    pub borrower_ltv: Decimal,
    /// Fraction (0–1).
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidation_threshold: Decimal,
    pub urgency: Severity,
    #[serde(with = "rust_decimal::serde::str")]
    pub collateral_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub debt_usd: Decimal,
    pub primary_collateral: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub distance_to_liquidation: Option<Decimal>,
    pub upstream_risk_category: Option<RiskCategory>,
}
