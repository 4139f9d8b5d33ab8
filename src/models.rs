/// The stablecoin every lending adapter looks for.
pub const TARGET_SYMBOL: &str = "USD1";

/// Display value for a rate that could not be determined.
pub const RATE_UNAVAILABLE: &str = "N/A";

/// One protocol's USD1 lending market, normalized to USD amounts and
/// display-ready rate strings.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRow {
    pub protocol: &'static str,
    pub total_supplied: Option<f64>,
    pub supply_rate: String,
    pub total_borrowed: Option<f64>,
    pub borrow_rate: String,
}

impl MarketRow {
    /// Row for a protocol whose data could not be fetched or located.
    pub fn unavailable(protocol: &'static str) -> Self {
        Self {
            protocol,
            total_supplied: None,
            supply_rate: RATE_UNAVAILABLE.to_string(),
            total_borrowed: None,
            borrow_rate: RATE_UNAVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StablecoinMetrics {
    pub symbol: String,
    pub market_cap_usd: Option<i64>,
    pub change_1d_pct: Option<f64>,
    pub change_7d_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradingPair {
    pub pair: String,
    pub volume_usd: f64,
}
