//! Field bookkeeping for raw filter payloads.
//!
//! Every payload is read through [`Fields`], which remembers the keys that
//! were looked at. Whatever is left over with a value is reported once per
//! payload so nothing in the dump is dropped silently.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::source::is_unset;

pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
    consumed: BTreeSet<&'a str>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            consumed: BTreeSet::new(),
        }
    }

    /// Read a key and mark it consumed.
    pub(crate) fn take(&mut self, key: &'a str) -> Option<&'a Value> {
        self.consumed.insert(key);
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub(crate) fn str(&mut self, key: &'a str) -> Option<&'a str> {
        self.take(key).and_then(Value::as_str)
    }

    pub(crate) fn bool(&mut self, key: &'a str) -> bool {
        self.take(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub(crate) fn array(&mut self, key: &'a str) -> &'a [Value] {
        self.take(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn object(&mut self, key: &'a str) -> Option<&'a Map<String, Value>> {
        self.take(key).and_then(Value::as_object)
    }

    /// Keys that carry a value but were never read, sorted.
    pub(crate) fn leftover(&self) -> Vec<&'a str> {
        self.map
            .iter()
            .filter(|(key, value)| !self.consumed.contains(key.as_str()) && !is_unset(value))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// One message naming every leftover key, or `None`.
    pub(crate) fn leftover_message(&self, path: &str) -> Option<String> {
        let keys = self.leftover();
        if keys.is_empty() {
            return None;
        }
        Some(format!("{path} fields {} are not supported", keys.join(", ")))
    }
}

pub(crate) fn camel_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut upper = false;
    for c in raw.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Rename every object key to camelCase, recursively. Objects held under a
/// key in `keep` are user data: their own keys stay as written while their
/// values are still converted.
pub(crate) fn camel_keys(value: &Value, keep: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let converted = match inner {
                        Value::Object(entries) if keep.contains(&key.as_str()) => Value::Object(
                            entries
                                .iter()
                                .map(|(k, v)| (k.clone(), camel_keys(v, keep)))
                                .collect(),
                        ),
                        _ => camel_keys(inner, keep),
                    };
                    (camel_case(key), converted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| camel_keys(v, keep)).collect()),
        other => other.clone(),
    }
}

/// Split an envoy comma-separated header list.
pub(crate) fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
