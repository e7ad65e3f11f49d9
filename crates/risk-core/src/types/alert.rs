use rust_decimal::Decimal;
use serde::Serialize;

use super::risk::Severity;
use super::time::EventTime;

/// One entry of the risk alerts feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAlert {
    pub id: String,
    pub severity: Severity,
    /// Upstream alert type, `GENERAL` when absent.
    pub kind: String,
    pub message: String,
    pub borrower: Option<String>,
    pub chain: Option<String>,
    pub token: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub health_factor: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub collateral_usd: Option<Decimal>,
    pub action_required: Option<String>,
    pub timestamp: EventTime,
}
