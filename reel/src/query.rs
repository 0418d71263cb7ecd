//! Canonical query strings and cache keys.
//!
//! Parameters with no value or an empty value never reach the query string, and
//! names are kept sorted, so two requests carrying the same set of non-empty
//! parameters always produce the same string no matter how they were built.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::form_urlencoded;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any earlier value. `None` and values
    /// whose string form is empty are ignored.
    pub fn set<V: ToString>(&mut self, name: impl Into<String>, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.pairs.insert(name.into(), value);
            }
        }
        self
    }

    pub fn with<V: ToString>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.set(name, value);
        self
    }

    /// Builds parameters from a JSON object, dropping `null` and empty-string members.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let mut params = Self::new();
        for (name, value) in object {
            params.set(name.as_str(), json_param_value(value));
        }
        params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.get(name).map(String::as_str)
    }

    /// `""` when there are no parameters, otherwise `?` followed by the
    /// form-urlencoded pairs.
    pub fn to_query_string(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }

        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish();
        format!("?{}", encoded)
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for QueryParams
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}

/// Cache key for a logical request: the key prefix (or the path when no prefix
/// is given) followed by the canonical query string.
pub fn cache_key(path: &str, key_prefix: Option<&str>, params: &QueryParams) -> String {
    let base = match key_prefix {
        Some(prefix) if !prefix.is_empty() => prefix,
        _ => path,
    };
    format!("{}{}", base, params.to_query_string())
}

fn json_param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(json_param_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}
