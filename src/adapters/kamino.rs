//! Kamino on Solana: supply side from the Steakhouse USD1 vault, borrow
//! side summed across the lending markets the vault allocates into.

use super::LendingAdapter;
use crate::config::Endpoints;
use crate::errors::FetchError;
use crate::http::{HttpFetcher, browser_headers};
use crate::json::{field_f64, find_market_by_symbol};
use crate::models::{MarketRow, TARGET_SYMBOL};
use async_trait::async_trait;
use serde_json::Value;

const NAME: &str = "Kamino";

const VAULT: &str = "2eCcHyUfFmiLX5RnNY21Qfndqww7TmwaKBgNXX5Unu7o";

const MARKETS: [(&str, &str); 3] = [
    ("Main Market", "7u3HeHxYDLhnCoErrtycNokbQYbWGzLs6JSDqGAv5PfF"),
    ("Maple Market", "6WEGfej9B9wjxRs6t4BYpb9iCXd8CpTpJ8fVSNzHCC5y"),
    ("JLP Market", "DxXdAyU3kCjnyggvHmY5nAwg5cRbbmdyX3npfDMjjMek"),
];

pub struct Kamino {
    base_url: String,
}

impl Kamino {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            base_url: endpoints.kamino_base.trim_end_matches('/').to_string(),
        }
    }

    fn vault_url(&self) -> String {
        format!("{}/kvaults/vaults/{VAULT}/metrics", self.base_url)
    }

    fn reserves_url(&self, market: &str) -> String {
        format!("{}/kamino-market/{market}/reserves/metrics", self.base_url)
    }
}

/// USD1 borrowed in one market's reserve list, 0 when it has no USD1 reserve.
fn reserve_borrow(reserves: &Value) -> f64 {
    reserves
        .as_array()
        .and_then(|_| find_market_by_symbol(reserves, TARGET_SYMBOL, &["liquidityToken"], 2))
        .and_then(|reserve| field_f64(reserve, "totalBorrow"))
        .unwrap_or(0.0)
}

/// `reserves` holds the reserve list of every market that answered.
pub(crate) fn parse_market(vault: &Value, reserves: &[Value]) -> Result<MarketRow, FetchError> {
    let metrics = vault
        .as_object()
        .ok_or_else(|| FetchError::UnexpectedData("Kamino vault metrics not an object".to_string()))?;
    let pct = |key: &str| field_f64(metrics, key).unwrap_or(0.0) * 100.0;

    let supplied = field_f64(metrics, "tokensAvailableUsd").unwrap_or(0.0)
        + field_f64(metrics, "tokensInvestedUsd").unwrap_or(0.0);

    let lend = pct("apy");
    let wlfi = pct("apyFarmRewards");
    let kmno = pct("apyIncentives");
    let combined = lend + wlfi + kmno;

    // The vault exposes no borrow APY; the lend APY stands in for it.
    Ok(MarketRow {
        protocol: NAME,
        total_supplied: Some(supplied),
        supply_rate: format!(
            "{combined:.2}% (lend {lend:.2}% + WLFI {wlfi:.2}% + KMNO {kmno:.2}%)"
        ),
        total_borrowed: Some(reserves.iter().map(reserve_borrow).sum()),
        borrow_rate: format!("{lend:.2}%"),
    })
}

#[async_trait]
impl LendingAdapter for Kamino {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_market(&self, http: &HttpFetcher) -> Result<MarketRow, FetchError> {
        let headers = browser_headers();
        let vault = http.get_json_with(&self.vault_url(), &headers).await?;

        let mut reserves = Vec::with_capacity(MARKETS.len());
        for (label, market) in MARKETS {
            match http.get_json_with(&self.reserves_url(market), &headers).await {
                Ok(list) => reserves.push(list),
                Err(e) => tracing::debug!("[{NAME}] skipping {label}: {e}"),
            }
        }

        parse_market(&vault, &reserves)
    }
}
