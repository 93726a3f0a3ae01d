//! Object attribute maps returned by `svcinfo` queries.
//!
//! Both transports normalize their output to [`Attributes`]: the REST
//! transport from a JSON object, the SSH transport from the `key:value`
//! lines of a detailed `-delim :` listing.

use std::collections::BTreeMap;

use serde_json::Value;

/// Attribute name to value, as reported by the cluster.
pub type Attributes = BTreeMap<String, String>;

/// Helper trait for working with attribute maps.
pub trait AttributesExt {
    /// Gets the value for a field, if present.
    fn get_field(&self, field: &str) -> Option<&str>;

    /// Gets the value for a field, returning the default if not present.
    fn get_field_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str;

    /// Gets the value for a field, treating an empty value as absent.
    fn non_empty_field(&self, field: &str) -> Option<&str>;

    /// Checks if a field exists.
    fn has_field(&self, field: &str) -> bool;
}

impl AttributesExt for Attributes {
    fn get_field(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }

    fn get_field_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str {
        self.get_field(field).unwrap_or(default)
    }

    fn non_empty_field(&self, field: &str) -> Option<&str> {
        self.get_field(field).filter(|v| !v.is_empty())
    }

    fn has_field(&self, field: &str) -> bool {
        self.contains_key(field)
    }
}

/// Builds an [`Attributes`] map from key-value pairs.
#[macro_export]
macro_rules! attributes {
    ($($field:expr => $value:expr),* $(,)?) => {{
        let mut attrs = $crate::attributes::Attributes::new();
        $(attrs.insert($field.to_string(), $value.to_string());)*
        attrs
    }};
}

/// Converts a REST `svcinfo` response into attributes.
///
/// Detailed views come back as a single object; some firmware levels wrap
/// it in a one-element array. An empty object, an empty array or `null`
/// means no object.
pub fn from_json(value: &Value) -> Option<Attributes> {
    match value {
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => Some(
            map.iter()
                .map(|(k, v)| (k.clone(), json_scalar(v)))
                .collect(),
        ),
        Value::Array(items) => items.first().and_then(from_json),
        _ => None,
    }
}

fn json_scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parses a detailed CLI listing produced with `-delim <delim>`.
///
/// Returns `None` when the output holds no attribute lines.
pub fn parse_delimited(output: &str, delim: char) -> Option<Attributes> {
    let attrs: Attributes = output
        .lines()
        .filter_map(|line| line.split_once(delim))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect();

    if attrs.is_empty() {
        None
    } else {
        Some(attrs)
    }
}
