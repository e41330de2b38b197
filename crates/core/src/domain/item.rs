use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DomainError;

/// Comparison key for an item name: trimmed and uppercased.
///
/// Only ever used for matching and de-duplication; display always keeps the
/// casing found in the rule set.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalItem(String);

impl CanonicalItem {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts a loosely typed record value into an item name.
///
/// Strings pass through untouched, numbers and booleans use their textual form.
/// Returns `None` for null and for structured values.
pub fn coerce_item(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_EXACT_FLOAT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Like [`coerce_item`], but an integral float such as `536365.0` yields its
/// integer text so it keys the same order as `536365`.
pub fn coerce_identifier(value: &Value) -> Option<String> {
    match value.as_f64() {
        Some(float)
            if value.is_f64() && float.fract() == 0.0 && float.abs() <= MAX_EXACT_FLOAT_INTEGER =>
        {
            Some((float as i64).to_string())
        }
        _ => coerce_item(value),
    }
}

/// Coerces every basket entry to a string, rejecting entries that have no
/// string form.
pub fn coerce_basket(values: &[Value]) -> Result<Vec<String>, DomainError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            coerce_item(value).ok_or_else(|| DomainError::InvalidBasketItem {
                index,
                reason: describe_kind(value).to_owned(),
            })
        })
        .collect()
}

fn describe_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
    }
}
