//! Lista Moolah vault on BNB Chain.

use super::LendingAdapter;
use crate::config::Endpoints;
use crate::errors::FetchError;
use crate::http::HttpFetcher;
use crate::json::{array_at, field_f64, field_str, lenient_f64, typed_entries};
use crate::models::{MarketRow, RATE_UNAVAILABLE, TARGET_SYMBOL};
use crate::normalize::format_percent;
use async_trait::async_trait;
use ordered_float::OrderedFloat;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Reverse;

const NAME: &str = "Lista";
const TARGET_VAULT: &str = "0xfa27f172e0b6ebcef9c51abf817e2cb142fbe627";

/// Markets considered for the borrow-rate range, by allocation size.
const TOP_N_MARKETS: usize = 5;

#[derive(Debug, Deserialize)]
struct Allocation {
    #[serde(default, deserialize_with = "lenient_f64")]
    allocation: Option<f64>,

    #[serde(rename = "borrowRate", default, deserialize_with = "lenient_f64")]
    borrow_rate: Option<f64>,
}

pub struct Lista {
    vault_list_url: String,
    allocation_url: String,
}

impl Lista {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            vault_list_url: endpoints.lista_vault_list.clone(),
            allocation_url: endpoints.lista_vault_allocation.clone(),
        }
    }
}

/// First vault that is either the known USD1 vault or denominated in USD1.
fn find_usd1_vault(vaults: &[Value]) -> Option<&Map<String, Value>> {
    vaults.iter().filter_map(Value::as_object).find(|vault| {
        field_str(vault, "address").to_lowercase() == TARGET_VAULT
            || field_str(vault, "assetSymbol").to_uppercase() == TARGET_SYMBOL
    })
}

/// `"min%-max%"` over the borrow rates of the largest allocations.
fn borrow_rate_range(markets: &[Value]) -> String {
    let mut parsed: Vec<(f64, f64)> = typed_entries::<Allocation>(markets)
        .into_iter()
        .filter_map(|m| Some((m.allocation?, m.borrow_rate?)))
        .collect();

    if parsed.is_empty() {
        return RATE_UNAVAILABLE.to_string();
    }

    parsed.sort_by_key(|(allocation, _)| Reverse(OrderedFloat(*allocation)));
    let top = &parsed[..parsed.len().min(TOP_N_MARKETS)];

    let min = top.iter().map(|(_, r)| *r).fold(f64::INFINITY, f64::min);
    let max = top.iter().map(|(_, r)| *r).fold(f64::NEG_INFINITY, f64::max);

    format!("{:.2}%-{:.2}%", min * 100.0, max * 100.0)
}

/// Vault-level figures; the borrow rate comes from a second request.
struct VaultSummary {
    address: String,
    deposits: Option<f64>,
    apy: Option<f64>,
    utilization: Option<f64>,
}

fn summarize_vault(vault_list: &Value) -> Option<VaultSummary> {
    let vault = find_usd1_vault(array_at(vault_list, "/data/list"))?;
    let address = match field_str(vault, "address") {
        "" => TARGET_VAULT,
        addr => addr,
    };

    Some(VaultSummary {
        address: address.to_string(),
        deposits: field_f64(vault, "deposits"),
        apy: field_f64(vault, "apy"),
        utilization: field_f64(vault, "utilization"),
    })
}

fn build_row(vault: &VaultSummary, allocation: &Value) -> MarketRow {
    let total_borrowed = match (vault.deposits, vault.utilization) {
        (Some(deposits), Some(utilization)) => Some(deposits * utilization),
        _ => None,
    };

    MarketRow {
        protocol: NAME,
        total_supplied: vault.deposits,
        supply_rate: format_percent(vault.apy.map(|apy| apy * 100.0)),
        total_borrowed,
        borrow_rate: borrow_rate_range(array_at(allocation, "/data/list")),
    }
}

#[async_trait]
impl LendingAdapter for Lista {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_market(&self, http: &HttpFetcher) -> Result<MarketRow, FetchError> {
        let list_url = format!("{}?sort=depositsUsd&order=desc&chain=bsc", self.vault_list_url);
        let vault_list = http.get_json(&list_url).await?;

        let Some(vault) = summarize_vault(&vault_list) else {
            return Ok(MarketRow::unavailable(NAME));
        };

        let allocation_url = format!("{}?address={}&chain=bsc", self.allocation_url, vault.address);
        let allocation = http.get_json(&allocation_url).await?;

        Ok(build_row(&vault, &allocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_vault_by_address_or_symbol() {
        let vaults = vec![
            json!("junk"),
            json!({"address": "0x1", "assetSymbol": "USDT"}),
            json!({"address": "0xFA27F172E0B6EBCEF9C51ABF817E2CB142FBE627", "assetSymbol": "?"}),
        ];
        let found = find_usd1_vault(&vaults).unwrap();
        assert_eq!(found["assetSymbol"], json!("?"));

        let by_symbol = vec![json!({"address": "0x2", "assetSymbol": "usd1"})];
        assert!(find_usd1_vault(&by_symbol).is_some());
    }

    #[test]
    fn borrow_range_uses_top_allocations() {
        let markets = vec![
            json!({"allocation": "100", "borrowRate": "0.061"}),
            json!({"allocation": 900, "borrowRate": 0.045}),
            json!({"allocation": 50, "borrowRate": 0.2}),
            json!({"allocation": 400, "borrowRate": "0.052"}),
            json!({"allocation": 300, "borrowRate": 0.048}),
            json!({"allocation": 200, "borrowRate": 0.07}),
            json!({"allocation": 10}),
        ];

        assert_eq!(borrow_rate_range(&markets), "4.50%-7.00%");
        assert_eq!(borrow_rate_range(&[]), "N/A");
    }

    #[test]
    fn builds_row_from_vault_and_allocations() {
        let vault_list = json!({"data": {"list": [
            {"address": "0xfa27f172e0b6ebcef9c51abf817e2cb142fbe627", "deposits": "80000000", "apy": 0.0634, "utilization": "0.75"}
        ]}});
        let allocation = json!({"data": {"list": [{"allocation": 1, "borrowRate": 0.0811}]}});

        let vault = summarize_vault(&vault_list).unwrap();
        let row = build_row(&vault, &allocation);

        assert_eq!(row.total_supplied, Some(80_000_000.0));
        assert_eq!(row.total_borrowed, Some(60_000_000.0));
        assert_eq!(row.supply_rate, "6.34%");
        assert_eq!(row.borrow_rate, "8.11%-8.11%");
    }

    #[test]
    fn missing_vault_or_fields() {
        assert!(summarize_vault(&json!({"data": {"list": []}})).is_none());

        let vault = summarize_vault(&json!({"data": {"list": [{"assetSymbol": "USD1"}]}})).unwrap();
        assert_eq!(vault.address, TARGET_VAULT);

        let row = build_row(&vault, &json!({}));
        assert_eq!(row.total_borrowed, None);
        assert_eq!(row.supply_rate, "N/A");
        assert_eq!(row.borrow_rate, "N/A");
    }
}
