use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Health factor bands
// ---------------------------------------------------------------------------

/// Below this the position is eligible for liquidation.
pub const HF_LIQUIDATION: Decimal = dec!(1.0);
pub const HF_CRITICAL_MAX: Decimal = dec!(1.1);
pub const HF_HIGH_RISK_MAX: Decimal = dec!(1.3);
pub const HF_MEDIUM_RISK_MAX: Decimal = dec!(1.5);
pub const HF_LOW_RISK_MAX: Decimal = dec!(2.0);

/// Upstream sends very large numbers instead of infinity for debt-free positions.
pub const HF_INFINITE_CUTOFF: Decimal = dec!(1000);

/// Default threshold used by the risky-position and risk-signal endpoints.
pub const DEFAULT_RISK_THRESHOLD_HF: Decimal = dec!(1.5);

// ---------------------------------------------------------------------------
// Gauges
// ---------------------------------------------------------------------------

/// Average-health-factor gauge multiplier: HF 5.0 saturates at 100.
pub const AVG_HF_GAUGE_SCALE: Decimal = dec!(20);

pub const GAUGE_MAX: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Fetch defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Size of the positions sample classified when upstream has no histogram.
pub const DISTRIBUTION_SAMPLE_LIMIT: u32 = 500;
