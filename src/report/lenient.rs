//! Forgiving field decoders for endpoint replies.
//!
//! The endpoints are LLM-backed workflows; numbers arrive as strings, strings
//! arrive as numbers, lists arrive as `null`. A field that cannot be read
//! degrades to its default instead of failing the whole reply.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Any value, falling back to `T::default()` when it does not fit.
pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(d)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Strings, numbers and booleans as text; anything else as `""`.
pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?).unwrap_or_default())
}

/// Like [`string`], but blank values become `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?).filter(|s| !s.trim().is_empty()))
}

/// `true`, `"true"` and non-zero numbers are true.
pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// Numbers or numeric strings (`"12"`, `"45.5%"`); anything else is 0.
pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_number(&s).unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Like [`number`], truncated to a non-negative count.
pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let n = number(d)?;
    Ok(if n.is_finite() && n > 0.0 { n as u32 } else { 0 })
}

/// A list of strings; non-string entries are dropped, non-lists are empty.
pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(value_to_string)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

/// A list of `T`; entries that do not decode are skipped.
pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Parse `"45.5%"`, `" 12 "` or `"7"` as a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}
