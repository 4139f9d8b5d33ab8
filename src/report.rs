//! Renders the daily report as Telegram Markdown.

use crate::models::{MarketRow, StablecoinMetrics, TradingPair};
use crate::normalize::compact_amount;
use crate::stablecoins::{format_pct, format_usd_compact};
use chrono::NaiveDate;

/// Protocol pages linked under the markets table, in display order.
const PROTOCOL_LINKS: [(&str, &str); 5] = [
    (
        "WLFI Markets",
        "https://markets.worldlibertyfinancial.com/market/0x8d0d000ee44948fc98c9b98a4fa4921476f08b0d",
    ),
    (
        "Echelon",
        "https://app.echelon.market/market/0xbb8f38636896c629ff9ef0bf916791a992e12ab4f1c6e26279ee9c6979646963?network=aptos_mainnet",
    ),
    ("Kamino", "https://kamino.com/lend/steakhouse-usd1-high-yield"),
    (
        "Lista",
        "https://lista.org/lending/vault/bsc/0xfa27f172e0b6ebcef9c51abf817e2cb142fbe627?tab=vault",
    ),
    (
        "JustLend",
        "https://app.justlend.org/marketDetailNew?jtokenAddress=TBEKggwqFkrc4KckQVR9BLucAmQugafEZf&_from=/homeNew&lang=en-US",
    ),
];

const DEFILLAMA_URL: &str = "https://defillama.com/stablecoins";
const ASTER_URL: &str = "https://coinmarketcap.com/exchanges/aster-pro/?type=spot";

fn short_name(protocol: &str) -> String {
    protocol.replace(" Markets", "")
}

/// Headline rate: everything before the breakdown in parentheses.
fn primary_rate(rate: &str) -> &str {
    match rate.split_once('(') {
        Some((head, _)) => head.trim(),
        None => rate,
    }
}

/// The breakdown inside the parentheses, if any.
fn rate_breakdown(rate: &str) -> Option<&str> {
    rate.split('(').nth(1).map(|inner| inner.trim_end_matches(')'))
}

/// Positive changes get an explicit sign; blanks stay blank.
fn signed(change: String) -> String {
    if change.is_empty() || change.starts_with('-') {
        change
    } else {
        format!("+{change}")
    }
}

fn format_volume(volume: f64) -> String {
    if volume >= 1_000_000.0 {
        format!("${:.2}M", volume / 1_000_000.0)
    } else if volume >= 1_000.0 {
        format!("${:.0}K", volume / 1_000.0)
    } else {
        format!("${volume:.0}")
    }
}

fn push_markets(lines: &mut Vec<String>, markets: &[MarketRow]) {
    lines.push("USD1 MARKETS".to_string());
    lines.push("```".to_string());
    lines.push("          Supplied    Rate    Borrowed    Rate".to_string());
    lines.push("─".repeat(47));

    let mut details = Vec::new();
    for row in markets {
        let name = short_name(row.protocol);
        lines.push(format!(
            "{:<10} ${:<9} {:<6}  ${:<9} {}",
            name,
            compact_amount(row.total_supplied),
            primary_rate(&row.supply_rate),
            compact_amount(row.total_borrowed),
            primary_rate(&row.borrow_rate),
        ));

        let parts: Vec<String> = [("S", &row.supply_rate), ("B", &row.borrow_rate)]
            .into_iter()
            .filter_map(|(side, rate)| rate_breakdown(rate).map(|b| format!("{side}: {b}")))
            .collect();
        if !parts.is_empty() {
            details.push(format!("• {name}: {}", parts.join(" | ")));
        }
    }
    lines.push("```".to_string());

    if !details.is_empty() {
        lines.push(String::new());
        lines.push("Rate details:".to_string());
        lines.extend(details);
    }

    lines.push(String::new());
    let links: Vec<String> = PROTOCOL_LINKS
        .iter()
        .map(|(protocol, url)| format!("[{}]({url})", short_name(protocol)))
        .collect();
    lines.push(format!("→ {}", links.join(" | ")));
}

fn push_stablecoins(lines: &mut Vec<String>, stablecoins: &[StablecoinMetrics]) {
    lines.push(String::new());
    lines.push("STABLECOINS".to_string());
    lines.push("```".to_string());
    lines.push("Token  Market Cap    1D       7D".to_string());
    lines.push("─".repeat(33));

    for coin in stablecoins {
        lines.push(format!(
            "{:<5}  {:<11}  {:>7}  {:>7}",
            coin.symbol,
            format_usd_compact(coin.market_cap_usd),
            signed(format_pct(coin.change_1d_pct)),
            signed(format_pct(coin.change_7d_pct)),
        ));
    }

    lines.push("```".to_string());
    lines.push(format!("→ [DefiLlama]({DEFILLAMA_URL})"));
}

fn push_pairs(lines: &mut Vec<String>, pairs: &[TradingPair]) {
    if pairs.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("ASTER USD1 PAIRS".to_string());
    lines.push("```".to_string());
    lines.push("Pair          Volume (24h)".to_string());
    lines.push("─".repeat(27));
    for p in pairs {
        lines.push(format!("{:<12}  {:>12}", p.pair, format_volume(p.volume_usd)));
    }
    lines.push("```".to_string());
    lines.push(format!("→ [Aster]({ASTER_URL})"));
}

/// Builds the full report. Output depends only on the arguments.
pub fn format_report(
    date: NaiveDate,
    stablecoins: &[StablecoinMetrics],
    markets: &[MarketRow],
    pairs: &[TradingPair],
) -> String {
    let mut lines = vec![
        format!("📊 DAILY REPORT | {}", date.format("%Y-%m-%d")),
        String::new(),
    ];

    push_markets(&mut lines, markets);
    push_stablecoins(&mut lines, stablecoins);
    push_pairs(&mut lines, pairs);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn market(protocol: &'static str, supply_rate: &str, borrow_rate: &str) -> MarketRow {
        MarketRow {
            protocol,
            total_supplied: Some(12_500_000.0),
            supply_rate: supply_rate.to_string(),
            total_borrowed: Some(8_250.0),
            borrow_rate: borrow_rate.to_string(),
        }
    }

    fn coin(symbol: &str, cap: i64, d1: Option<f64>, d7: Option<f64>) -> StablecoinMetrics {
        StablecoinMetrics {
            symbol: symbol.to_string(),
            market_cap_usd: Some(cap),
            change_1d_pct: d1,
            change_7d_pct: d7,
        }
    }

    #[test]
    fn splits_primary_rate_and_breakdown() {
        let rate = "7.74% (base 2.93% + inc 4.81%)";
        assert_eq!(primary_rate(rate), "7.74%");
        assert_eq!(rate_breakdown(rate), Some("base 2.93% + inc 4.81%"));
        assert_eq!(primary_rate("4.50%-7.00%"), "4.50%-7.00%");
        assert_eq!(rate_breakdown("N/A"), None);
    }

    #[test]
    fn formats_volume_tiers() {
        assert_eq!(format_volume(2_345_678.0), "$2.35M");
        assert_eq!(format_volume(45_600.0), "$46K");
        assert_eq!(format_volume(999.4), "$999");
    }

    #[test]
    fn renders_market_rows_and_details() {
        let markets = vec![
            market("WLFI Markets", "7.74% (base 2.93% + inc 4.81%)", "5.12%"),
            MarketRow::unavailable("Echelon"),
        ];
        let report = format_report(date(), &[], &markets, &[]);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "📊 DAILY REPORT | 2026-10-19");
        assert_eq!(lines[6], "WLFI       $12.50M    7.74%   $8.25K     5.12%");
        assert_eq!(lines[7], "Echelon    $N/A       N/A     $N/A       N/A");
        assert!(report.contains("Rate details:\n• WLFI: S: base 2.93% + inc 4.81%\n"));
        assert!(!report.contains("• Echelon"));
        assert!(lines.iter().any(|l| l.starts_with("→ [WLFI](") && l.ends_with("lang=en-US)")));
    }

    #[test]
    fn renders_signed_stablecoin_changes() {
        let coins = vec![
            coin("USDT", 183_456_000_000, Some(0.12), Some(-1.5)),
            coin("USD1", 2_750_000_000, Some(0.0), None),
        ];
        let report = format_report(date(), &coins, &[], &[]);

        assert!(report.contains("\nUSDT   $183.456B     +0.12%   -1.50%\n"));
        assert!(report.contains("\nUSD1   $2.750B       +0.00%         \n"));
        assert!(report.ends_with("→ [DefiLlama](https://defillama.com/stablecoins)"));
    }

    #[test]
    fn pairs_section_only_when_present() {
        let pairs = vec![TradingPair {
            pair: "USD1/USDT".to_string(),
            volume_usd: 8_800_000.0,
        }];

        let with = format_report(date(), &[], &[], &pairs);
        assert!(with.contains("ASTER USD1 PAIRS"));
        assert!(with.contains("\nUSD1/USDT           $8.80M\n"));

        let without = format_report(date(), &[], &[], &[]);
        assert!(!without.contains("ASTER USD1 PAIRS"));
    }

    #[test]
    fn output_is_deterministic() {
        let markets = vec![market("Kamino", "1.00%", "2.00%")];
        let coins = vec![coin("USDC", 75_000_000_000, Some(0.5), Some(1.0))];
        assert_eq!(
            format_report(date(), &coins, &markets, &[]),
            format_report(date(), &coins, &markets, &[])
        );
    }
}
