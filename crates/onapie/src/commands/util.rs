//! Shared helpers for command handlers.
//!
//! Options arrive already coerced (a numeric pk is an `Int`), so argument
//! structs use the lenient deserializers here for fields that are strings to
//! the server.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::commands::InvokeError;
use crate::options::{OptionValue, Options};

/// Decode the option map into an argument struct.
pub fn decode<T: DeserializeOwned>(options: &Options) -> Result<T, InvokeError> {
    let value = serde_json::to_value(options).map_err(|e| InvokeError::BadArguments(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| InvokeError::BadArguments(e.to_string()))
}

/// Options not named in `params`, in name order.
pub fn extras<'o>(options: &'o Options, params: &[&str]) -> BTreeMap<&'o str, &'o OptionValue> {
    options
        .iter()
        .filter(|(name, _)| !params.contains(&name.as_str()))
        .map(|(name, value)| (name.as_str(), value))
        .collect()
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".into()),
        Value::Bool(false) => Some("False".into()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A string, number or boolean, as text.
pub fn text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    scalar_text(Value::deserialize(de)?).ok_or_else(|| D::Error::custom("expected a single value"))
}

/// Optional form of [`text`]; pair with `#[serde(default)]`.
pub fn opt_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    text(de).map(Some)
}

/// A comma-separated list (`--tags a,b`); empty items are dropped.
pub fn comma_list<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    Ok(text(de)?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect())
}

/// A boolean, also accepting `True` / `False` / `1` / `0` given as text.
pub fn flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    match Value::deserialize(de)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::String(s) => match s.as_str() {
            "True" | "true" | "1" => Ok(true),
            "False" | "false" | "0" => Ok(false),
            _ => Err(D::Error::custom(format!("expected a boolean, got '{s}'"))),
        },
        other => Err(D::Error::custom(format!("expected a boolean, got {other}"))),
    }
}
