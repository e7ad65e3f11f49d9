use serde::Serialize;

/// Logical remote resource served by the aggregation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    QuickStats,
    ProtocolHealth,
    RiskSummary,
    Positions,
    RiskyPositions,
    PositionsSummary,
    Reserves,
    ReserveRiskMetrics,
    LiquidationHistory,
    LiquidationTrends,
    RiskAlerts,
    RiskSignals,
    RiskyBorrowers,
    CrossChain,
    Chains,
}

impl ResourceKind {
    /// Stable identifier, also used as the key for per-resource TTL overrides.
    pub fn name(&self) -> &'static str {
        match self {
            Self::QuickStats => "quick_stats",
            Self::ProtocolHealth => "protocol_health",
            Self::RiskSummary => "risk_summary",
            Self::Positions => "positions",
            Self::RiskyPositions => "risky_positions",
            Self::PositionsSummary => "positions_summary",
            Self::Reserves => "reserves",
            Self::ReserveRiskMetrics => "reserve_risk_metrics",
            Self::LiquidationHistory => "liquidation_history",
            Self::LiquidationTrends => "liquidation_trends",
            Self::RiskAlerts => "risk_alerts",
            Self::RiskSignals => "risk_signals",
            Self::RiskyBorrowers => "risky_borrowers",
            Self::CrossChain => "cross_chain",
            Self::Chains => "chains",
        }
    }

    /// Key under which a keyed envelope (`{ "<key>": [...] }`) carries the
    /// records of a list resource. `None` for single-object resources.
    pub fn envelope_key(&self) -> Option<&'static str> {
        match self {
            Self::Positions | Self::RiskyPositions | Self::PositionsSummary => Some("positions"),
            Self::Reserves => Some("reserves"),
            Self::ReserveRiskMetrics => Some("metrics"),
            Self::LiquidationHistory => Some("liquidations"),
            Self::RiskAlerts => Some("alerts"),
            Self::RiskSignals => Some("signals"),
            Self::CrossChain => Some("comparison"),
            Self::Chains => Some("chains"),
            Self::QuickStats
            | Self::ProtocolHealth
            | Self::RiskSummary
            | Self::LiquidationTrends
            | Self::RiskyBorrowers => None,
        }
    }
}
