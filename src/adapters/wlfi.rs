//! WLFI Markets (Dolomite deployment on Ethereum), served over tRPC.

use super::LendingAdapter;
use crate::config::Endpoints;
use crate::errors::FetchError;
use crate::http::{HttpFetcher, browser_headers};
use crate::json::{field_f64, find_market_by_symbol, lenient_f64, typed_entries};
use crate::models::{MarketRow, TARGET_SYMBOL};
use crate::normalize::{format_percent, format_rate};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

const NAME: &str = "WLFI Markets";

/// One component of the supply rate paid outside the base interest.
#[derive(Debug, Deserialize)]
struct RatePart {
    #[serde(default)]
    label: Option<String>,

    #[serde(rename = "rewardClaimUrl", default)]
    reward_claim_url: Option<String>,

    #[serde(rename = "interestRate", default, deserialize_with = "lenient_f64")]
    interest_rate: Option<f64>,
}

impl RatePart {
    /// Only Merkl campaigns and WLFI reward emissions count as incentives.
    fn is_incentive(&self) -> bool {
        let label = self.label.as_deref().unwrap_or("").to_lowercase();
        let claim_url = self.reward_claim_url.as_deref().unwrap_or("").to_lowercase();
        label.contains("merkl") || claim_url.contains("merkl") || label.contains("wlfi rewards")
    }
}

pub struct Wlfi {
    tokens_url: String,
    rates_url: String,
}

impl Wlfi {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            tokens_url: endpoints.wlfi_tokens.clone(),
            rates_url: endpoints.wlfi_rates.clone(),
        }
    }
}

/// tRPC wraps results as `{"result":{"data":{"json": ...}}}`, sometimes
/// inside a single-element batch array.
fn unwrap_trpc(payload: &Value) -> Result<&Value, FetchError> {
    let envelope = match payload {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| FetchError::UnexpectedData("empty tRPC batch".to_string()))?,
        other => other,
    };

    envelope
        .pointer("/result/data/json")
        .ok_or_else(|| FetchError::UnexpectedData("tRPC envelope missing result.data.json".to_string()))
}

/// Interest-rate entries keyed by the market id of the token they describe.
fn rates_by_market(rates: &[Value]) -> HashMap<String, &Value> {
    rates
        .iter()
        .filter_map(|r| {
            let market_id = r.get("token")?.as_object()?.get("marketId")?;
            (!market_id.is_null()).then(|| (market_id.to_string(), r))
        })
        .collect()
}

pub(crate) fn parse_market(tokens: &Value, rates: &Value) -> MarketRow {
    let Some(token) = find_market_by_symbol(tokens, TARGET_SYMBOL, &["symbol"], 2) else {
        return MarketRow::unavailable(NAME);
    };
    let Some(market_id) = token.get("marketId").filter(|id| !id.is_null()) else {
        return MarketRow::unavailable(NAME);
    };

    let supplied = field_f64(token, "supplyLiquidity");
    let borrowed = field_f64(token, "borrowLiquidity");

    let rate_entries = rates.as_array().map(Vec::as_slice).unwrap_or(&[]);
    let by_market = rates_by_market(rate_entries);
    let Some(rate) = by_market.get(&market_id.to_string()).and_then(|r| r.as_object()) else {
        return MarketRow {
            total_supplied: supplied,
            total_borrowed: borrowed,
            ..MarketRow::unavailable(NAME)
        };
    };

    let base_supply = field_f64(rate, "supplyInterestRate");
    let borrow = field_f64(rate, "borrowInterestRate");

    let parts: Vec<RatePart> = rate
        .get("outsideSupplyInterestRateParts")
        .and_then(Value::as_array)
        .map(|parts| typed_entries(parts))
        .unwrap_or_default();
    let incentive: f64 = parts
        .iter()
        .filter(|p| p.is_incentive())
        .filter_map(|p| p.interest_rate)
        .sum();

    let supply_rate = format_rate(
        base_supply.map(|r| r * 100.0),
        (incentive > 0.0).then_some(incentive * 100.0),
        false,
    );

    MarketRow {
        protocol: NAME,
        total_supplied: supplied,
        supply_rate,
        total_borrowed: borrowed,
        borrow_rate: format_percent(borrow.map(|r| r * 100.0)),
    }
}

#[async_trait]
impl LendingAdapter for Wlfi {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_market(&self, http: &HttpFetcher) -> Result<MarketRow, FetchError> {
        let headers = browser_headers();
        let tokens = http.get_json_with(&self.tokens_url, &headers).await?;
        let rates = http.get_json_with(&self.rates_url, &headers).await?;

        Ok(parse_market(unwrap_trpc(&tokens)?, unwrap_trpc(&rates)?))
    }
}
