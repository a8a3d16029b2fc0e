//! Cell values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single table cell.
///
/// Serialized untagged so initial-data documents can use plain JSON
/// integers, strings and `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL-style NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 text.
    Text(String),
}

impl Value {
    /// Converts an opaque log token into a typed value.
    ///
    /// Tokens that parse as `i64` become [`Value::Integer`], `NULL` (any case)
    /// becomes [`Value::Null`], and everything else is kept as text.
    #[must_use]
    pub fn coerce(token: &str) -> Self {
        let token = token.trim();
        if let Ok(n) = token.parse::<i64>() {
            Self::Integer(n)
        } else if token.eq_ignore_ascii_case("null") {
            Self::Null
        } else {
            Self::Text(token.to_string())
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}
