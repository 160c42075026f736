//! Fnr: the external parcel join key

use serde::{Deserialize, Serialize};
use std::fmt;

/// External key identifying a parcel, used to correlate parcel and owner records.
///
/// Services return it either as text or as an integer. Two fnrs that differ
/// only in representation (`"100"` vs `100`) group together via [`Fnr::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fnr {
    Number(i64),
    Text(String),
}

impl Fnr {
    /// Normalized grouping key.
    pub fn key(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }

    /// True if the key is empty (blank text).
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    /// Literal suitable for an attribute `where` clause.
    pub fn sql_literal(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => format!("'{}'", s.trim().replace('\'', "''")),
        }
    }

    /// Read an fnr from a JSON attribute value.
    ///
    /// Whole-valued doubles are accepted as numbers; anything else that is
    /// not a string or number yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Number(i))
                } else {
                    let f = n.as_f64()?;
                    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| Self::Number(f as i64))
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Fnr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl From<i64> for Fnr {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Fnr {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Fnr {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}
