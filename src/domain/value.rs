use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A flat component profile: attribute key to scalar value.
///
/// Keys are kept in lexical order so that serialized instances and tag
/// inference are deterministic.
pub type Profile = BTreeMap<String, ProfileValue>;

/// A single scalar attribute value in a [`Profile`].
///
/// Coercion from free-form user input into these variants happens in the
/// profile editor, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    /// An explicit null. Treated exactly like a missing key.
    Null,
    /// A boolean flag.
    Bool(bool),
    /// A number, preserved in its JSON rendering.
    Number(Number),
    /// Free text or an enumerated choice.
    Text(String),
}

impl ProfileValue {
    /// Whether this value is an explicit null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value carries usable content.
    ///
    /// Null and whitespace-only text are not present.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Text(s) => !s.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => true,
        }
    }

    /// The numeric view of this value.
    ///
    /// Numbers convert directly, text is parsed after trimming. Booleans and
    /// null have no numeric view.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::Null => None,
        }
    }
}

impl fmt::Display for ProfileValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ProfileValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ProfileValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ProfileValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ProfileValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for ProfileValue {
    /// Non-finite floats have no JSON representation and become null.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

/// Look up a key, treating explicit nulls as absent.
#[must_use]
pub fn lookup<'a>(profile: &'a Profile, key: &str) -> Option<&'a ProfileValue> {
    profile.get(key).filter(|value| !value.is_null())
}
