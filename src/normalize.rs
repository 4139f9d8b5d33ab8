use crate::json::as_f64;
use crate::models::RATE_UNAVAILABLE;
use serde_json::Value;

/// Rates at or below this magnitude are read as fractions.
const FRACTION_THRESHOLD: f64 = 1.5;

/// Converts a rate to percent. Values with magnitude <= 1.5 are taken as
/// fractions and scaled by 100; larger ones are assumed to be percent
/// already. A genuine 1.2% and a 1.2 fraction are indistinguishable.
pub fn normalize_rate(value: &Value) -> Option<f64> {
    let rate = as_f64(value)?;
    if rate.abs() <= FRACTION_THRESHOLD {
        Some(rate * 100.0)
    } else {
        Some(rate)
    }
}

/// Converts a raw token amount, scaling down by `10^decimals` when given.
pub fn normalize_amount(value: &Value, decimals: Option<u32>) -> Option<f64> {
    let amount = as_f64(value)?;
    match decimals {
        Some(d) if d > 0 => Some(amount / 10f64.powi(d as i32)),
        _ => Some(amount),
    }
}

/// Plain two-decimal percent, e.g. `7.73%`.
pub fn format_percent(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{rate:.2}%"),
        None => RATE_UNAVAILABLE.to_string(),
    }
}

/// Formats a percent rate with an optional incentive breakdown.
///
/// Supply incentives add to the base rate; borrow incentives reduce the
/// effective cost.
pub fn format_rate(base: Option<f64>, incentive: Option<f64>, is_borrow: bool) -> String {
    let Some(base) = base else {
        return RATE_UNAVAILABLE.to_string();
    };

    match incentive {
        None => format!("{base:.2}%"),
        Some(inc) if inc == 0.0 => format!("{base:.2}%"),
        Some(inc) if is_borrow => {
            format!("{:.2}% (borrow {base:.2}% - inc {inc:.2}%)", base - inc)
        }
        Some(inc) => format!("{:.2}% (base {base:.2}% + inc {inc:.2}%)", base + inc),
    }
}

/// Abbreviates an amount with a T/B/M/K suffix and two decimals.
pub fn compact_amount(x: Option<f64>) -> String {
    let Some(x) = x else {
        return RATE_UNAVAILABLE.to_string();
    };

    const TIERS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    TIERS
        .iter()
        .find(|(threshold, _)| x >= *threshold)
        .map(|(threshold, suffix)| format!("{:.2}{suffix}", x / threshold))
        .unwrap_or_else(|| format!("{x:.2}"))
}
