//! Endpoint URL resolution and query parameters.
//!
//! Local backends take paths as given. Remote backends live under `/api`,
//! and an endpoint that already carries that segment is not prefixed twice.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Path segment prepended for remote backends.
pub const API_PREFIX: &str = "/api";

/// A scalar query parameter value, rendered with its display form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Bool(v) => write!(f, "{v}"),
            QueryValue::Int(v) => write!(f, "{v}"),
            QueryValue::Float(v) => write!(f, "{v}"),
            QueryValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Str(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Str(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::Int(v)
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        QueryValue::Int(v.into())
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        QueryValue::Int(v.into())
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::Float(v)
    }
}

/// Query parameters in insertion order. Repeated keys are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query(Vec<(String, QueryValue)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Join `endpoint` onto the configured base and append `query`.
pub fn resolve(config: &ClientConfig, endpoint: &str, query: Option<&Query>) -> Result<Url, ApiError> {
    let local = config.is_local();

    let mut path = format!("/{}", endpoint.trim_start_matches('/'));
    if !local && has_api_prefix(&path) {
        path = path[API_PREFIX.len()..].to_string();
    }

    let joined = if local {
        format!("{}{path}", config.base_url())
    } else {
        format!("{}{API_PREFIX}{path}", config.base_url())
    };

    let mut url = Url::parse(&joined)?;
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query.iter() {
            pairs.append_pair(key, &value.to_string());
        }
    }
    Ok(url)
}

fn has_api_prefix(path: &str) -> bool {
    match path.strip_prefix(API_PREFIX) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
