//! Helpers for walking loosely-typed upstream JSON.
//!
//! Protocol APIs disagree on whether numbers are strings, where the market
//! list lives and which key carries the token symbol. Everything here fails
//! closed: a missing or mistyped field reads as "not found".

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Keys that commonly carry a token symbol in market listings.
pub const DEFAULT_SYMBOL_KEYS: &[&str] = &[
    "symbol",
    "ticker",
    "underlyingSymbol",
    "tokenSymbol",
    "asset",
    "name",
    "token",
    "coinSymbol",
    "assetSymbol",
];

pub const DEFAULT_DEPTH_LIMIT: usize = 6;

/// Reads a number, or a string holding one.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// `as_f64` on an optional field of an object.
pub fn field_f64(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(as_f64)
}

/// String field, or "" when missing or not a string.
pub fn field_str<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Deserialize a value that may be a number, a numeric string, or anything
/// else (which becomes `None`).
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_f64))
}

/// Parses each element into `T`, dropping elements of the wrong shape.
pub fn typed_entries<T: DeserializeOwned>(values: &[Value]) -> Vec<T> {
    values
        .iter()
        .filter(|v| v.is_object())
        .filter_map(|v| T::deserialize(v).ok())
        .collect()
}

/// Array at a JSON pointer, or an empty slice.
pub fn array_at<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn matches_symbol(obj: &Map<String, Value>, symbol: &str, keys: &[&str]) -> bool {
    let wanted = symbol.to_uppercase();
    keys.iter().any(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_uppercase() == wanted)
    })
}

/// Depth-first search for the first object whose symbol-bearing key equals
/// `symbol` (case-insensitive). Objects are checked before their children.
pub fn find_market_by_symbol<'a>(
    value: &'a Value,
    symbol: &str,
    keys: &[&str],
    depth_limit: usize,
) -> Option<&'a Map<String, Value>> {
    fn visit<'a>(
        value: &'a Value,
        symbol: &str,
        keys: &[&str],
        depth: usize,
        limit: usize,
    ) -> Option<&'a Map<String, Value>> {
        if depth >= limit {
            return None;
        }
        match value {
            Value::Object(obj) => {
                if matches_symbol(obj, symbol, keys) {
                    return Some(obj);
                }
                obj.values()
                    .find_map(|child| visit(child, symbol, keys, depth + 1, limit))
            }
            Value::Array(items) => items
                .iter()
                .find_map(|item| visit(item, symbol, keys, depth + 1, limit)),
            _ => None,
        }
    }

    visit(value, symbol, keys, 0, depth_limit)
}

/// Every object matching `symbol`. A matched object is not searched further.
pub fn find_all_markets_by_symbol<'a>(
    value: &'a Value,
    symbol: &str,
    keys: &[&str],
    depth_limit: usize,
) -> Vec<&'a Map<String, Value>> {
    fn visit<'a>(
        value: &'a Value,
        symbol: &str,
        keys: &[&str],
        depth: usize,
        limit: usize,
        out: &mut Vec<&'a Map<String, Value>>,
    ) {
        if depth >= limit {
            return;
        }
        match value {
            Value::Object(obj) => {
                if matches_symbol(obj, symbol, keys) {
                    out.push(obj);
                } else {
                    for child in obj.values() {
                        visit(child, symbol, keys, depth + 1, limit, out);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    visit(item, symbol, keys, depth + 1, limit, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    visit(value, symbol, keys, 0, depth_limit, &mut out);
    out
}

const SHAPE_MAX_DEPTH: usize = 3;
const SHAPE_MAX_ITEMS: usize = 3;
const SHAPE_PREVIEW_CHARS: usize = 50;

/// Short structural preview of a payload, one line per entry.
pub fn describe_shape(value: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    shape_lines(value, 2, 0, &mut lines);
    lines
}

fn shape_lines(value: &Value, indent: usize, depth: usize, out: &mut Vec<String>) {
    let prefix = "  ".repeat(indent);

    if depth >= SHAPE_MAX_DEPTH {
        out.push(format!("{prefix}..."));
        return;
    }

    match value {
        Value::Object(obj) => {
            let keys: Vec<&String> = obj.keys().take(SHAPE_MAX_ITEMS).collect();
            let more = if obj.len() > SHAPE_MAX_ITEMS { "..." } else { "" };
            out.push(format!("{prefix}dict with {} keys: {keys:?}{more}", obj.len()));
            for key in keys.iter().take(2) {
                out.push(format!("{prefix}  '{key}':"));
                shape_lines(&obj[key.as_str()], indent + 2, depth + 1, out);
            }
        }
        Value::Array(items) => {
            out.push(format!("{prefix}list with {} items", items.len()));
            if let Some(first) = items.first() {
                if depth < SHAPE_MAX_DEPTH - 1 {
                    out.push(format!("{prefix}  [0]:"));
                    shape_lines(first, indent + 2, depth + 1, out);
                }
            }
        }
        Value::String(s) => {
            let preview: String = s.chars().take(SHAPE_PREVIEW_CHARS).collect();
            let ellipsis = if s.chars().count() > SHAPE_PREVIEW_CHARS { "..." } else { "" };
            out.push(format!("{prefix}str: \"{preview}{ellipsis}\""));
        }
        Value::Number(n) if n.is_f64() => out.push(format!("{prefix}float: {n}")),
        Value::Number(n) => out.push(format!("{prefix}int: {n}")),
        Value::Bool(b) => out.push(format!("{prefix}bool: {b}")),
        Value::Null => out.push(format!("{prefix}null")),
    }
}
