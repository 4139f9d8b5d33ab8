//! Echelon lending on Aptos.

use super::LendingAdapter;
use crate::config::Endpoints;
use crate::errors::FetchError;
use crate::http::{HttpFetcher, browser_headers};
use crate::json::{array_at, field_f64, field_str, find_market_by_symbol, lenient_f64, typed_entries};
use crate::models::{MarketRow, TARGET_SYMBOL};
use crate::normalize::format_rate;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

const NAME: &str = "Echelon";

#[derive(Debug, Deserialize)]
struct FarmingEntry {
    #[serde(default, deserialize_with = "lenient_f64")]
    apr: Option<f64>,
}

pub struct Echelon {
    markets_url: String,
}

impl Echelon {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            markets_url: endpoints.echelon_markets.clone(),
        }
    }
}

/// `marketStats` is a list of `[address, stats]` pairs.
fn stats_for<'a>(data: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    array_at(data, "/marketStats")
        .iter()
        .filter_map(Value::as_array)
        .filter(|pair| pair.len() == 2)
        .filter(|pair| pair[0].as_str() == Some(key))
        .last()
        .and_then(|pair| pair[1].as_object())
}

/// Sum of the farming APRs listed for one side of the market.
fn farming_total(asset: &Map<String, Value>, side: &str) -> f64 {
    asset
        .get("farmingApr")
        .and_then(|f| f.get(side))
        .and_then(Value::as_array)
        .map(|entries| {
            typed_entries::<FarmingEntry>(entries)
                .iter()
                .map(|e| e.apr.unwrap_or(0.0))
                .sum::<f64>()
        })
        .unwrap_or(0.0)
}

pub(crate) fn parse_market(data: &Value) -> MarketRow {
    let Some(asset) = data
        .get("assets")
        .and_then(|assets| find_market_by_symbol(assets, TARGET_SYMBOL, &["symbol"], 2))
    else {
        return MarketRow::unavailable(NAME);
    };

    let stats_key = match field_str(asset, "faAddress") {
        "" => field_str(asset, "address"),
        fa => fa,
    };
    let Some(stats) = stats_for(data, stats_key) else {
        return MarketRow::unavailable(NAME);
    };

    // Rates are fractions.
    let lend_apr = field_f64(asset, "supplyApr").unwrap_or(0.0);
    let borrow_apr = field_f64(asset, "borrowApr").unwrap_or(0.0);
    let inc_supply = farming_total(asset, "supply");
    let inc_borrow = farming_total(asset, "borrow");

    MarketRow {
        protocol: NAME,
        total_supplied: field_f64(stats, "totalShares"),
        supply_rate: format_rate(
            Some(lend_apr * 100.0),
            (inc_supply > 0.0).then_some(inc_supply * 100.0),
            false,
        ),
        total_borrowed: field_f64(stats, "totalLiability"),
        borrow_rate: format_rate(
            Some(borrow_apr * 100.0),
            (inc_borrow > 0.0).then_some(inc_borrow * 100.0),
            true,
        ),
    }
}

#[async_trait]
impl LendingAdapter for Echelon {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_market(&self, http: &HttpFetcher) -> Result<MarketRow, FetchError> {
        let root = http.get_json_with(&self.markets_url, &browser_headers()).await?;
        let data = root
            .get("data")
            .ok_or_else(|| FetchError::UnexpectedData("Echelon response missing data".to_string()))?;

        Ok(parse_market(data))
    }
}
