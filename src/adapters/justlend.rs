//! JustLend on TRON.

use super::LendingAdapter;
use crate::config::Endpoints;
use crate::errors::FetchError;
use crate::http::HttpFetcher;
use crate::json::find_market_by_symbol;
use crate::models::{MarketRow, TARGET_SYMBOL};
use crate::normalize::{format_rate, normalize_amount, normalize_rate};
use async_trait::async_trait;
use serde_json::{Map, Value};

const NAME: &str = "JustLend";

pub struct JustLend {
    yields_url: String,
}

impl JustLend {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            yields_url: endpoints.justlend_yields.clone(),
        }
    }
}

fn supply_rate(market: &Map<String, Value>) -> String {
    let base = market.get("depositedAPY").and_then(normalize_rate);
    let incentive = market
        .get("underlyingIncrementApy")
        .filter(|v| v.as_str() != Some("0"))
        .and_then(normalize_rate);
    format_rate(base, incentive, false)
}

fn borrow_rate(market: &Map<String, Value>) -> String {
    format_rate(market.get("borrowedAPY").and_then(normalize_rate), None, false)
}

pub(crate) fn parse_market(root: &Value) -> MarketRow {
    let Some(market) = root
        .pointer("/data/assetList")
        .filter(|list| list.is_array())
        .and_then(|list| find_market_by_symbol(list, TARGET_SYMBOL, &["collateralSymbol"], 2))
    else {
        return MarketRow::unavailable(NAME);
    };

    // USD values are reported directly; no token decimals to undo.
    MarketRow {
        protocol: NAME,
        total_supplied: market.get("depositedUSD").and_then(|v| normalize_amount(v, None)),
        supply_rate: supply_rate(market),
        total_borrowed: market.get("borrowedUSD").and_then(|v| normalize_amount(v, None)),
        borrow_rate: borrow_rate(market),
    }
}

#[async_trait]
impl LendingAdapter for JustLend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_market(&self, http: &HttpFetcher) -> Result<MarketRow, FetchError> {
        let root = http.get_json(&self.yields_url).await?;
        Ok(parse_market(&root))
    }
}
