use rust_decimal::Decimal;
use serde::Serialize;

use super::time::EventTime;

/// A completed liquidation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidationEvent {
    pub id: String,
    pub chain: String,
    pub borrower: Option<String>,
    pub collateral_symbol: String,
    pub debt_symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub collateral_seized_usd: Decimal,
    /// `None` while upstream has not priced the repaid debt yet.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub debt_repaid_usd: Option<Decimal>,
    pub liquidation_date: EventTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetCount {
    pub asset: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainShare {
    pub chain: String,
    pub count: u64,
    /// Fraction (0–1).
    #[serde(with = "rust_decimal::serde::str")]
    pub share: Decimal,
}

/// Liquidation activity over a trailing window.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LiquidationTrends {
    pub period_days: u32,
    pub liquidations_24h: u64,
    pub liquidations_7d: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume_usd_24h: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume_usd_7d: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub daily_average_7d: Decimal,
    pub trend: String,
    pub top_liquidated_assets: Vec<AssetCount>,
    pub chain_distribution: Vec<ChainShare>,
}
