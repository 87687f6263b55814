use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::{Profile, ProfileValue};

/// Naming convention used to locate profiles and tag fields by suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConvention {
    /// Suffix of fields holding a component tag, e.g. `valve_tag`.
    pub tag_suffix: String,
    /// Suffix of instance keys holding an embedded profile, e.g.
    /// `valve_profile`.
    pub profile_suffix: String,
}

impl Default for TagConvention {
    fn default() -> Self {
        Self {
            tag_suffix: "_tag".to_string(),
            profile_suffix: "_profile".to_string(),
        }
    }
}

impl TagConvention {
    /// The lexically-first field ending in the tag suffix that has a present
    /// value.
    #[must_use]
    pub fn infer_tag_field<'a>(&self, profile: &'a Profile) -> Option<&'a str> {
        profile
            .iter()
            .find(|(key, value)| key.ends_with(&self.tag_suffix) && value.is_present())
            .map(|(key, _)| key.as_str())
    }

    /// Resolve the tag value of a profile.
    ///
    /// `preferred` is used when it holds a present value, otherwise the field
    /// is inferred from the convention.
    #[must_use]
    pub fn tag_value(&self, profile: &Profile, preferred: Option<&str>) -> Option<String> {
        let field = preferred
            .filter(|field| profile.get(*field).is_some_and(ProfileValue::is_present))
            .or_else(|| self.infer_tag_field(profile))?;
        profile.get(field).map(|value| value.to_string().trim().to_string())
    }

    /// Locate a tag among a set of embedded profiles.
    ///
    /// Profiles are searched in key order; the first one whose key ends in
    /// the profile suffix and which yields a tag wins.
    #[must_use]
    pub fn tag_from_embedded(&self, embedded: &BTreeMap<String, Profile>) -> Option<String> {
        embedded
            .iter()
            .filter(|(key, _)| key.ends_with(&self.profile_suffix))
            .find_map(|(_, profile)| self.tag_value(profile, None))
    }
}
