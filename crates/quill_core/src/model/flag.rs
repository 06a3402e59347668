//! Serde helpers for SQLite's integer-backed booleans.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts `true`/`false`, `0`/`1` (SQLite storage) and `null` (as `false`).
pub(crate) fn bool_from_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        Value::Number(number) => Ok(number.as_i64().is_some_and(|value| value != 0)),
        Value::Null => Ok(false),
        other => Err(D::Error::custom(format!(
            "expected boolean flag, got `{other}`"
        ))),
    }
}
