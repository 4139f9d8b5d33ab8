mod adapters;
mod config;
mod errors;
mod exchange;
mod http;
mod json;
mod models;
mod normalize;
mod report;
mod stablecoins;
mod telegram;

use anyhow::Context;
use config::Config;
use errors::ConfigError;
use exchange::ExchangePairsClient;
use http::HttpFetcher;
use models::{MarketRow, TARGET_SYMBOL};
use stablecoins::StablecoinClient;
use std::process::ExitCode;
use telegram::TelegramClient;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Every registered protocol, one at a time, in registry order.
async fn fetch_markets(config: &Config, client: reqwest::Client) -> Vec<MarketRow> {
    tracing::info!("Fetching USD1 lending markets...");
    let http = HttpFetcher::new(client, config.request_timeout).with_debug(config.debug);

    let mut rows = Vec::new();
    for adapter in adapters::registry(&config.endpoints) {
        rows.push(adapters::fetch_row(adapter.as_ref(), &http).await);
    }
    rows
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .build()
        .context("building HTTP client")?;
    let endpoints = &config.endpoints;

    tracing::info!("Fetching stablecoin data...");
    let stablecoins = StablecoinClient::new(client.clone(), &endpoints.stablecoins)
        .fetch_metrics(&config.stablecoin_tokens)
        .await
        .context("fetching stablecoin data")?;

    let markets = fetch_markets(config, client.clone()).await;

    tracing::info!("Fetching Aster USD1 pairs...");
    let pairs = ExchangePairsClient::new(client.clone(), &endpoints.exchange_pairs)
        .fetch_pairs(TARGET_SYMBOL)
        .await
        .context("fetching exchange pairs")?;

    let today = chrono::Local::now().date_naive();
    let message = report::format_report(today, &stablecoins, &markets, &pairs);

    let rule = "=".repeat(40);
    println!("\n{rule}\nFORMATTED MESSAGE:\n{rule}\n{message}\n{rule}\n");

    TelegramClient::new(
        client,
        &endpoints.telegram_api,
        &config.telegram_bot_token,
        &config.telegram_chat_id,
    )
    .send_message(&message)
    .await
    .context("delivering report to Telegram")?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(ConfigError::Missing(name)) => {
            tracing::error!("{name} is not set");
            eprintln!(
                "Error: TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID environment variables are required.\n\
                 Set them with:\n  \
                 export TELEGRAM_BOT_TOKEN='your_token'\n  \
                 export TELEGRAM_CHAT_ID='your_chat_id'"
            );
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error: {e:#}");
            eprintln!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn canned_markets() -> Vec<MarketRow> {
        let wlfi = adapters::wlfi::parse_market(
            &json!([{"symbol": "USD1", "marketId": 5, "supplyLiquidity": 120000000, "borrowLiquidity": 60000000}]),
            &json!([{"token": {"marketId": 5}, "supplyInterestRate": 0.02, "borrowInterestRate": 0.04,
                     "outsideSupplyInterestRateParts": [{"label": "Merkl", "interestRate": 0.01}]}]),
        );
        let echelon = adapters::echelon::parse_market(&json!({
            "assets": [{"symbol": "USD1", "faAddress": "0x1", "supplyApr": 0.03, "borrowApr": 0.05}],
            "marketStats": [["0x1", {"totalShares": 2500000, "totalLiability": 1000000}]]
        }));
        let justlend = adapters::justlend::parse_market(&json!({"data": {"assetList": [
            {"collateralSymbol": "USD1", "depositedUSD": "900", "borrowedUSD": "100", "depositedAPY": "0.01", "borrowedAPY": "0.02"}
        ]}}));
        let kamino = adapters::kamino::parse_market(
            &json!({"tokensAvailableUsd": 1000, "tokensInvestedUsd": 2000, "apy": 0.05}),
            &[json!([{"liquidityToken": "USD1", "totalBorrow": 1500}])],
        )
        .unwrap();
        let lista = MarketRow::unavailable("Lista");

        vec![wlfi, echelon, justlend, kamino, lista]
    }

    #[test]
    fn end_to_end_report_keeps_every_protocol_in_order() {
        let tokens: Vec<String> = ["USDT", "PYUSD", "USD1"].iter().map(|s| s.to_string()).collect();
        let stablecoins = stablecoins::metrics_from_snapshot(
            &json!({"peggedAssets": [
                {"symbol": "USD1", "circulating": {"peggedUSD": 2.5e9}, "circulatingPrevDay": {"peggedUSD": 2.4e9}},
                {"symbol": "USDT", "circulating": {"peggedUSD": 1.8e11}, "circulatingPrevWeek": {"peggedUSD": 1.9e11}}
            ]}),
            &tokens,
        );
        let pairs = exchange::parse_pairs(
            r#"{"data": {"marketPairs": [{"marketPair": "USD1/USDT", "volumeUsd": 2500000}]}}"#,
            TARGET_SYMBOL,
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let report = report::format_report(date, &stablecoins, &canned_markets(), &pairs);
        let lines: Vec<&str> = report.lines().collect();

        let table: Vec<&str> = lines[6..11].iter().map(|l| l.split_whitespace().next().unwrap()).collect();
        assert_eq!(table, vec!["WLFI", "Echelon", "JustLend", "Kamino", "Lista"]);
        assert_eq!(lines[11], "```");

        assert!(report.contains("• WLFI: S: base 2.00% + inc 1.00%"));
        assert!(report.contains("• Kamino: S: lend 5.00% + WLFI 0.00% + KMNO 0.00%"));
        assert!(report.contains("\nUSDT   $180.000B              -5.26%\n"));
        assert!(report.contains("\nUSD1   $2.500B       +4.17%         \n"));
        assert!(!report.contains("PYUSD"));
        assert!(report.contains("ASTER USD1 PAIRS"));
        assert_eq!(report, report::format_report(date, &stablecoins, &canned_markets(), &pairs));
    }

    #[test]
    fn pairs_section_dropped_when_nothing_matches() {
        let pairs = exchange::parse_pairs(
            r#"{"data": {"marketPairs": [{"marketPair": "ETH/USDT", "volumeUsd": 1}]}}"#,
            TARGET_SYMBOL,
        )
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let report = report::format_report(date, &[], &canned_markets(), &pairs);

        assert!(!report.contains("ASTER USD1 PAIRS"));
    }
}
