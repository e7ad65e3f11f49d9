//! Read endpoints of the aggregation API and how their URLs are built.
//!
//! The full URL string (path plus query) is also the fetch gateway's cache
//! key, so two requests share a cache entry exactly when they would hit the
//! server with the same query.

use reqwest::Url;
use rust_decimal::Decimal;

use crate::constants::{DEFAULT_LIST_LIMIT, DEFAULT_PAGE_SIZE, DEFAULT_RISK_THRESHOLD_HF};
use crate::errors::RiskDataError;
use crate::types::{ResourceKind, RiskCategory, Severity};

/// Filters for `/positions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionsQuery {
    pub borrower_address: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub risk_category: Option<RiskCategory>,
    pub group_by_borrower: bool,
}

impl Default for PositionsQuery {
    fn default() -> Self {
        Self {
            borrower_address: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            risk_category: None,
            group_by_borrower: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    QuickStats,
    ProtocolHealth {
        chains: Vec<String>,
    },
    RiskSummary {
        chains: Vec<String>,
    },
    Positions(PositionsQuery),
    RiskyPositions {
        threshold_hf: Decimal,
        page: u32,
        page_size: u32,
    },
    PositionsSummary {
        page: u32,
        page_size: u32,
    },
    Reserves {
        chains: Vec<String>,
        active_only: bool,
        limit: u32,
    },
    ReserveRiskMetrics {
        chains: Vec<String>,
    },
    LiquidationHistory {
        limit: u32,
        chain: Option<String>,
    },
    LiquidationTrends {
        days: u32,
        chains: Vec<String>,
    },
    RiskAlerts {
        severity: Option<Severity>,
        limit: u32,
    },
    RiskSignals {
        threshold: Decimal,
        limit: u32,
    },
    RiskyBorrowers {
        threshold: Decimal,
        chains: Vec<String>,
    },
    CrossChain,
    Chains,
}

impl Endpoint {
    pub fn risky_positions(page: u32) -> Self {
        Self::RiskyPositions {
            threshold_hf: DEFAULT_RISK_THRESHOLD_HF,
            page,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::QuickStats => ResourceKind::QuickStats,
            Self::ProtocolHealth { .. } => ResourceKind::ProtocolHealth,
            Self::RiskSummary { .. } => ResourceKind::RiskSummary,
            Self::Positions(_) => ResourceKind::Positions,
            Self::RiskyPositions { .. } => ResourceKind::RiskyPositions,
            Self::PositionsSummary { .. } => ResourceKind::PositionsSummary,
            Self::Reserves { .. } => ResourceKind::Reserves,
            Self::ReserveRiskMetrics { .. } => ResourceKind::ReserveRiskMetrics,
            Self::LiquidationHistory { .. } => ResourceKind::LiquidationHistory,
            Self::LiquidationTrends { .. } => ResourceKind::LiquidationTrends,
            Self::RiskAlerts { .. } => ResourceKind::RiskAlerts,
            Self::RiskSignals { .. } => ResourceKind::RiskSignals,
            Self::RiskyBorrowers { .. } => ResourceKind::RiskyBorrowers,
            Self::CrossChain => ResourceKind::CrossChain,
            Self::Chains => ResourceKind::Chains,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::QuickStats => "/data/quick-stats",
            Self::ProtocolHealth { .. } => "/insights/protocol-health",
            Self::RiskSummary { .. } => "/protocol_risk_summary",
            Self::Positions(_) => "/positions",
            Self::RiskyPositions { .. } => "/positions/risky",
            Self::PositionsSummary { .. } => "/positions_summary",
            Self::Reserves { .. } => "/reserves/rpc",
            Self::ReserveRiskMetrics { .. } => "/reserve_risk_metrics",
            Self::LiquidationHistory { .. } => "/liquidation-history",
            Self::LiquidationTrends { .. } => "/liquidation_trends",
            Self::RiskAlerts { .. } => "/risk_alerts_feed",
            Self::RiskSignals { .. } => "/borrower_risk_signals",
            Self::RiskyBorrowers { .. } => "/protocol/risky-borrowers",
            Self::CrossChain => "/crosschain_risk_comparison",
            Self::Chains => "/chains/available",
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        match self {
            Self::QuickStats | Self::CrossChain | Self::Chains => {}
            Self::ProtocolHealth { chains }
            | Self::RiskSummary { chains }
            | Self::ReserveRiskMetrics { chains } => push_chains(&mut q, chains),
            Self::Positions(p) => {
                if let Some(address) = &p.borrower_address {
                    q.push(("borrower_address", address.clone()));
                }
                q.push(("limit", p.limit.to_string()));
                if p.offset > 0 {
                    q.push(("offset", p.offset.to_string()));
                }
                if let Some(category) = p.risk_category {
                    q.push(("risk_category", category.as_str().to_string()));
                }
                if p.group_by_borrower {
                    q.push(("group_by_borrower", "true".into()));
                }
            }
            Self::RiskyPositions {
                threshold_hf,
                page,
                page_size,
            } => {
                q.push(("threshold_hf", threshold_hf.normalize().to_string()));
                q.push(("page", page.to_string()));
                q.push(("page_size", page_size.to_string()));
            }
            Self::PositionsSummary { page, page_size } => {
                q.push(("page", page.to_string()));
                q.push(("page_size", page_size.to_string()));
            }
            Self::Reserves {
                chains,
                active_only,
                limit,
            } => {
                push_chains(&mut q, chains);
                q.push(("active_only", active_only.to_string()));
                q.push(("limit", limit.to_string()));
            }
            Self::LiquidationHistory { limit, chain } => {
                q.push(("limit", limit.to_string()));
                if let Some(chain) = chain {
                    q.push(("chain", chain.clone()));
                }
            }
            Self::LiquidationTrends { days, chains } => {
                q.push(("days", days.to_string()));
                push_chains(&mut q, chains);
            }
            Self::RiskAlerts { severity, limit } => {
                if let Some(severity) = severity {
                    q.push(("severity", severity.as_str().to_string()));
                }
                q.push(("limit", limit.to_string()));
            }
            Self::RiskSignals { threshold, limit } => {
                q.push(("threshold", threshold.normalize().to_string()));
                q.push(("limit", limit.to_string()));
            }
            Self::RiskyBorrowers { threshold, chains } => {
                q.push(("threshold", threshold.normalize().to_string()));
                push_chains(&mut q, chains);
            }
        }
        q
    }

    /// Absolute URL under `base` (e.g. `http://host:8080/api`).
    pub fn url(&self, base: &Url) -> Result<Url, RiskDataError> {
        let mut url = join_path(base, self.path())?;
        let query = self.query();
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

fn push_chains(q: &mut Vec<(&'static str, String)>, chains: &[String]) {
    if !chains.is_empty() {
        q.push(("chains", chains.join(",")));
    }
}

/// Append `path` to the base URL's own path, dropping any base query.
pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, RiskDataError> {
    if base.cannot_be_a_base() {
        return Err(RiskDataError::InvalidUrl {
            reason: format!("{base} cannot be used as a base URL"),
        });
    }
    let mut url = base.clone();
    url.set_path(&format!("{}{}", base.path().trim_end_matches('/'), path));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base() -> Url {
        Url::parse("http://localhost:8080/api").unwrap()
    }

    #[test]
    fn test_paths_append_to_base_path() {
        assert_eq!(
            Endpoint::QuickStats.url(&base()).unwrap().as_str(),
            "http://localhost:8080/api/data/quick-stats"
        );
        let trailing = Url::parse("https://risk.example.org/api/").unwrap();
        assert_eq!(
            Endpoint::Chains.url(&trailing).unwrap().as_str(),
            "https://risk.example.org/api/chains/available"
        );
    }

    #[test]
    fn test_positions_query() {
        let url = Endpoint::Positions(PositionsQuery {
            borrower_address: Some("0xabc".into()),
            limit: 25,
            offset: 0,
            risk_category: Some(RiskCategory::Critical),
            group_by_borrower: true,
        })
        .url(&base())
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/positions?borrower_address=0xabc&limit=25&risk_category=CRITICAL&group_by_borrower=true"
        );

        let default = Endpoint::Positions(PositionsQuery::default()).url(&base()).unwrap();
        assert_eq!(default.query(), Some("limit=100"));
    }

    #[test]
    fn test_threshold_and_paging() {
        let url = Endpoint::risky_positions(2).url(&base()).unwrap();
        assert_eq!(url.query(), Some("threshold_hf=1.5&page=2&page_size=100"));

        let url = Endpoint::RiskSignals {
            threshold: dec!(1.20),
            limit: 10,
        }
        .url(&base())
        .unwrap();
        assert_eq!(url.query(), Some("threshold=1.2&limit=10"));
    }

    #[test]
    fn test_chains_are_comma_joined() {
        let url = Endpoint::Reserves {
            chains: vec!["ethereum".into(), "base".into()],
            active_only: true,
            limit: 100,
        }
        .url(&base())
        .unwrap();
        assert_eq!(url.query(), Some("chains=ethereum%2Cbase&active_only=true&limit=100"));

        let url = Endpoint::ProtocolHealth { chains: vec![] }.url(&base()).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_distinct_queries_are_distinct_keys() {
        let a = Endpoint::risky_positions(1).url(&base()).unwrap();
        let b = Endpoint::risky_positions(2).url(&base()).unwrap();
        assert_ne!(a.as_str(), b.as_str());
        assert_eq!(Endpoint::risky_positions(1).kind(), ResourceKind::RiskyPositions);
    }

    #[test]
    fn test_rejects_non_base_url() {
        let mailto = Url::parse("mailto:ops@example.org").unwrap();
        assert!(matches!(
            Endpoint::QuickStats.url(&mailto),
            Err(RiskDataError::InvalidUrl { .. })
        ));
    }
}
