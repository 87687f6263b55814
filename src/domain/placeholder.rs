//! `{{name}}` placeholder resolution.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::LazyLock,
};

use regex::{Captures, Regex};

use super::value::{Profile, ProfileValue, lookup};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// The result of resolving placeholders in a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instantiation {
    /// The text with every resolvable placeholder substituted.
    pub text: String,
    /// The profile values that were substituted, keyed by parameter name.
    pub used: BTreeMap<String, ProfileValue>,
    /// Parameter names left unresolved, in order of first appearance.
    pub unresolved: Vec<String>,
}

/// Substitute `{{name}}` placeholders in `text` with values from `profile`.
///
/// Placeholders whose key is missing (or null) in the profile are left in the
/// text untouched and reported in [`Instantiation::unresolved`]. Substituted
/// values are never re-scanned.
#[must_use]
pub fn instantiate(text: &str, profile: &Profile) -> Instantiation {
    let mut used = BTreeMap::new();
    let mut unresolved: Vec<String> = Vec::new();

    let resolved = PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
        let name = &caps[1];
        if let Some(value) = lookup(profile, name) {
            used.insert(name.to_string(), value.clone());
            value.to_string()
        } else {
            if !unresolved.iter().any(|n| n == name) {
                unresolved.push(name.to_string());
            }
            caps[0].to_string()
        }
    });

    Instantiation {
        text: resolved.into_owned(),
        used,
        unresolved,
    }
}

/// The distinct placeholder names literally present in `text`, sorted.
#[must_use]
pub fn placeholder_names(text: &str) -> BTreeSet<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}
