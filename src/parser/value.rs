//! Lenient numeric fields.
//!
//! Profile producers disagree on whether ids and timestamps are JSON
//! numbers or strings (decimal or `0x` hex). These helpers accept all of
//! them.

use crate::utils::error::ParseError;
use serde::{Deserialize, Deserializer};

/// Parse a u64 from a JSON number or a decimal/hex string
pub fn parse_json_u64(val: &serde_json::Value) -> Result<u64, ParseError> {
    if let Some(n) = val.as_u64() {
        Ok(n)
    } else if let Some(s) = val.as_str() {
        parse_u64_str(s)
    } else {
        Err(ParseError::InvalidFormat(format!(
            "Expected number or string, found {}",
            val
        )))
    }
}

/// Parse a u64 from a hex (`0x` prefix) or decimal string
pub fn parse_u64_str(value: &str) -> Result<u64, ParseError> {
    let value = value.trim();
    if let Some(hex_str) = value.strip_prefix("0x") {
        u64::from_str_radix(hex_str, 16)
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid hex value '{}': {}", value, e)))
    } else {
        value
            .parse::<u64>()
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid decimal value '{}': {}", value, e)))
    }
}

/// `deserialize_with` helper: number, numeric string, or null (0)
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(0);
    }
    parse_json_u64(&value).map_err(serde::de::Error::custom)
}

/// `deserialize_with` helper for optional fields; null stays `None`
pub fn lenient_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    parse_json_u64(&value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}
