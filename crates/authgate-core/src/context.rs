//! Typed authorization context.
//!
//! The context is an open key/value bag, but values are restricted to a
//! closed set of kinds (text, number, boolean). Keys the fallback policy and
//! the gateway understand are listed in [`keys`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known context keys.
pub mod keys {
    /// Principal age in years (number).
    pub const AGE: &str = "age";
    /// Available funds (number).
    pub const ACCOUNT_BALANCE: &str = "account_balance";
    /// Price of the game being purchased (number).
    pub const GAME_PRICE: &str = "game_price";
    /// ESRB-style rating of the game (`E`, `T`, `M`, `AO`, ...).
    pub const GAME_RATING: &str = "game_rating";
    /// Matched route of the guarded request.
    pub const ROUTE: &str = "route";
    /// HTTP method of the guarded request.
    pub const METHOD: &str = "method";
    /// Decision timestamp (RFC 3339), stamped by the decision point.
    pub const TIMESTAMP: &str = "timestamp";
    /// Client address, stamped by the decision point.
    pub const IP_ADDRESS: &str = "ip_address";
    /// Client user agent, stamped by the decision point.
    pub const USER_AGENT: &str = "user_agent";
    /// Prefix for flattened query arguments (`args.<name>`).
    pub const ARGS_PREFIX: &str = "args.";
}

/// A single context value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ContextValue {
    /// Numeric view. Text is parsed leniently so values that crossed a
    /// string-only boundary (headers, query strings) still compare.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ContextValue::Number(n) => Some(*n),
            ContextValue::Text(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            ContextValue::Bool(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContextValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        ContextValue::Text(v.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        ContextValue::Text(v)
    }
}

impl From<bool> for ContextValue {
    fn from(v: bool) -> Self {
        ContextValue::Bool(v)
    }
}

impl From<f64> for ContextValue {
    fn from(v: f64) -> Self {
        ContextValue::Number(v)
    }
}

impl From<i32> for ContextValue {
    fn from(v: i32) -> Self {
        ContextValue::Number(f64::from(v))
    }
}

impl From<i64> for ContextValue {
    fn from(v: i64) -> Self {
        ContextValue::Number(v as f64)
    }
}

impl From<u32> for ContextValue {
    fn from(v: u32) -> Self {
        ContextValue::Number(f64::from(v))
    }
}

/// Key/value context attached to an authorization request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthContext(BTreeMap<String, ContextValue>);

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or overwrite a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.0.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ContextValue::as_number)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ContextValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for AuthContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
