/// Payload normalization boundary
///
/// The upstream API returns heterogeneous JSON: endpoints answer with either
/// a bare array or an object wrapping a named array, records use several
/// spellings for the same field, and timestamps arrive in seconds or
/// milliseconds. Everything here converts those shapes into the fixed
/// internal records before any business logic touches them. Unrecognizable
/// input degrades to empty/None, never to an error.

use serde_json::Value;

use super::types::Trade;

/// Millisecond timestamps are distinguished by magnitude alone.
const MILLIS_THRESHOLD: f64 = 1e12;

/// Unwrap a response body that is either a bare JSON array or an object
/// holding the array under `field`.
///
/// An object without the field yields an empty list (the endpoint answered,
/// there was just nothing in it). An object whose field is not an array, or
/// a body that is neither array nor object, yields `None`: the shape is
/// unusable.
pub fn unwrap_list(body: &Value, field: &str) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map) => match map.get(field) {
            None => Some(Vec::new()),
            Some(Value::Array(items)) => Some(items.clone()),
            Some(_) => None,
        },
        _ => None,
    }
}

/// Normalize a raw epoch value to seconds.
pub fn normalize_timestamp(raw: f64) -> i64 {
    if raw > MILLIS_THRESHOLD {
        (raw / 1000.0) as i64
    } else {
        raw as i64
    }
}

/// Build a `Trade` from one raw trade record. Non-object entries are
/// dropped; within an object every field is best-effort.
pub fn trade(raw: &Value) -> Option<Trade> {
    let obj = raw.as_object()?;

    let timestamp = ["time", "timestamp", "ts"]
        .iter()
        .find_map(|key| {
            obj.get(*key)
                .and_then(Value::as_f64)
                .filter(|ts| *ts != 0.0)
        })
        .map(normalize_timestamp);

    let side = ["type", "side"]
        .iter()
        .find_map(|key| non_empty_str(obj.get(*key)))
        .map(|s| s.to_lowercase());

    // Nested destination token takes precedence over the flat spellings.
    let nested = raw
        .get("to")
        .filter(|to| to.is_object())
        .and_then(|to| non_empty_str(to.get("address")));
    let token = nested.or_else(|| {
        ["token", "mint", "tokenAddress", "token_address"]
            .iter()
            .find_map(|key| non_empty_str(obj.get(*key)))
    });

    Some(Trade {
        timestamp,
        side,
        token,
    })
}

/// Flatten a top-traders response into wallet addresses. Entries may be
/// bare strings or objects with any of the known address spellings; entries
/// with none of them are dropped. Duplicates pass through untouched.
pub fn wallet_addresses(body: &Value) -> Vec<String> {
    let entries = unwrap_list(body, "wallets").unwrap_or_default();

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(addr) => Some(addr.clone()),
            Value::Object(map) => ["wallet", "owner", "address", "pubkey"]
                .iter()
                .find_map(|key| non_empty_str(map.get(*key))),
            _ => None,
        })
        .collect()
}

/// Order-preserving deduplication for the universe list.
pub fn dedupe_preserving_order(wallets: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    wallets
        .into_iter()
        .filter(|wallet| seen.insert(wallet.clone()))
        .collect()
}

/// Decide whether a holdings response shows a strictly positive balance of
/// `token`. Unmatchable entries and unusable shapes read as not holding.
pub fn holds_token(body: &Value, token: &str) -> bool {
    let holdings = unwrap_list(body, "holdings").unwrap_or_default();

    for entry in &holdings {
        let Some(map) = entry.as_object() else {
            continue;
        };
        let matches = ["token", "mint", "address"]
            .iter()
            .find_map(|key| non_empty_str(map.get(*key)))
            .is_some_and(|addr| addr == token);
        if matches && entry_balance(map) > 0.0 {
            return true;
        }
    }
    false
}

/// Balance of one holdings entry; `amount` covers records where `balance`
/// is absent or zero-valued. Numeric strings are accepted.
fn entry_balance(entry: &serde_json::Map<String, Value>) -> f64 {
    let balance = numeric(entry.get("balance"));
    if balance != 0.0 {
        balance
    } else {
        numeric(entry.get("amount"))
    }
}

fn numeric(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
