use crate::errors::FetchError;
use crate::http::browser_headers;
use crate::json::lenient_f64;
use crate::models::TradingPair;
use ordered_float::OrderedFloat;
use serde::Deserialize;
use std::cmp::Reverse;
use std::time::Duration;

/// The raw JSON shape CoinMarketCap's exchange market-pairs endpoint returns
#[derive(Debug, Deserialize)]
struct MarketPairsResponse {
    data: MarketPairsData,
}

#[derive(Debug, Deserialize)]
struct MarketPairsData {
    #[serde(rename = "marketPairs")]
    market_pairs: Vec<RawMarketPair>,
}

#[derive(Debug, Deserialize)]
struct RawMarketPair {
    #[serde(rename = "marketPair", default)]
    market_pair: String,

    #[serde(rename = "volumeUsd", default, deserialize_with = "lenient_f64")]
    volume_usd: Option<f64>,
}

/// Spot pairs listed on the Aster exchange.
pub struct ExchangePairsClient {
    client: reqwest::Client,
    url: String,
}

impl ExchangePairsClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Pairs quoting or basing on `symbol`, highest 24h volume first.
    pub async fn fetch_pairs(&self, symbol: &str) -> Result<Vec<TradingPair>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .headers(browser_headers())
            .timeout(Duration::from_secs(30))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_pairs(&response, symbol)
    }
}

pub(crate) fn parse_pairs(body: &str, symbol: &str) -> Result<Vec<TradingPair>, FetchError> {
    let response: MarketPairsResponse = serde_json::from_str(body)?;
    filter_pairs(response.data.market_pairs, symbol)
}

/// Only pairs containing `symbol` need a volume; the rest are dropped unread.
fn filter_pairs(pairs: Vec<RawMarketPair>, symbol: &str) -> Result<Vec<TradingPair>, FetchError> {
    let mut matching = pairs
        .into_iter()
        .filter(|p| p.market_pair.contains(symbol))
        .map(|p| match p.volume_usd {
            Some(volume_usd) => Ok(TradingPair {
                pair: p.market_pair,
                volume_usd,
            }),
            None => Err(FetchError::UnexpectedData(format!(
                "pair {} has no volumeUsd",
                p.market_pair
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    matching.sort_by_key(|p| Reverse(OrderedFloat(p.volume_usd)));
    Ok(matching)
}
