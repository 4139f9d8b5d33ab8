//! Circulating supply of major stablecoins from DefiLlama.

use crate::errors::FetchError;
use crate::http::{RetryPolicy, retry};
use crate::json::{array_at, as_f64, typed_entries};
use crate::models::StablecoinMetrics;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
struct PeggedAsset {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    circulating: Option<Value>,
    #[serde(rename = "circulatingPrevDay", default)]
    circulating_prev_day: Option<Value>,
    #[serde(rename = "circulatingPrevWeek", default)]
    circulating_prev_week: Option<Value>,
}

pub struct StablecoinClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl StablecoinClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Metrics for each requested symbol, in request order.
    pub async fn fetch_metrics(&self, tokens: &[String]) -> Result<Vec<StablecoinMetrics>, FetchError> {
        let snapshot = retry(self.retry, || {
            let request = self.client.get(&self.url).timeout(self.timeout);
            async move {
                let body = request
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<Value>()
                    .await?;
                Ok::<_, FetchError>(body)
            }
        })
        .await?;

        Ok(metrics_from_snapshot(&snapshot, tokens))
    }
}

/// Symbols the aggregator does not list, or lists without a supply, are
/// left out rather than shown empty.
pub(crate) fn metrics_from_snapshot(snapshot: &Value, tokens: &[String]) -> Vec<StablecoinMetrics> {
    let assets: Vec<PeggedAsset> = typed_entries(array_at(snapshot, "/peggedAssets"));
    tracing::debug!("DefiLlama returned {} pegged assets", assets.len());
    select_metrics(&assets, tokens)
}

fn select_metrics(assets: &[PeggedAsset], tokens: &[String]) -> Vec<StablecoinMetrics> {
    tokens
        .iter()
        .filter_map(|token| find_by_symbol(assets, token))
        .map(parse_metrics)
        .filter(|m| m.market_cap_usd.is_some())
        .collect()
}

fn find_by_symbol<'a>(assets: &'a [PeggedAsset], symbol: &str) -> Option<&'a PeggedAsset> {
    let wanted = symbol.to_uppercase();
    assets
        .iter()
        .find(|a| a.symbol.as_deref().unwrap_or("").to_uppercase() == wanted)
}

/// Supply is either `{"peggedUSD": n}` or a bare number.
fn circulating_value(data: Option<&Value>) -> Option<f64> {
    match data? {
        Value::Object(obj) => obj.get("peggedUSD").and_then(as_f64),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// `(current - previous) / previous * 100`, rounded to two decimals.
pub fn calculate_percent_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (current, previous) = (current?, previous?);
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    Some((change * 100.0).round() / 100.0)
}

fn parse_metrics(asset: &PeggedAsset) -> StablecoinMetrics {
    let current = circulating_value(asset.circulating.as_ref());
    let prev_day = circulating_value(asset.circulating_prev_day.as_ref());
    let prev_week = circulating_value(asset.circulating_prev_week.as_ref());

    StablecoinMetrics {
        symbol: asset.symbol.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
        market_cap_usd: current.map(|c| c as i64),
        change_1d_pct: calculate_percent_change(current, prev_day),
        change_7d_pct: calculate_percent_change(current, prev_week),
    }
}

/// `"1.23%"`, or empty when unknown.
pub fn format_pct(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}%")).unwrap_or_default()
}

/// Market cap as `$1.234B`, `$12.34M` or a bare `$999999`.
pub fn format_usd_compact(value: Option<i64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v >= 1_000_000_000 => format!("${:.3}B", v as f64 / 1e9),
        Some(v) if v >= 1_000_000 => format!("${:.2}M", v as f64 / 1e6),
        Some(v) => format!("${v}"),
    }
}
