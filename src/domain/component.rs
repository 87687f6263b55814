use std::fmt;

/// Where a component's profile lives in an instance, and how it is tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTarget {
    /// Component name, e.g. `valve`.
    pub name: String,
    /// Instance key under which the profile is embedded.
    pub profile_key: String,
    /// The profile field holding the component's primary tag.
    pub tag_field: String,
}

/// Built-in components as `(name, tag field)`.
const BUILTIN: &[(&str, &str)] = &[
    ("valve", "valve_tag"),
    ("pump", "pump_tag"),
    ("steam_generator", "sg_tag"),
    ("turbine", "turbine_tag"),
    ("condenser", "condenser_tag"),
    ("pressurizer", "pressurizer_tag"),
];

impl ComponentTarget {
    /// Resolve a component by name.
    ///
    /// Lookup is case-insensitive. Names outside the built-in registry get a
    /// target derived from the `<name>_profile` / `<name>_tag` convention.
    #[must_use]
    pub fn named(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        let tag_field = BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map_or_else(|| format!("{name}_tag"), |(_, tag)| (*tag).to_string());

        Self {
            profile_key: format!("{name}_profile"),
            tag_field,
            name,
        }
    }

    /// Every built-in component, in registry order.
    pub fn builtin() -> impl Iterator<Item = Self> {
        BUILTIN.iter().map(|(name, _)| Self::named(name))
    }

    /// Whether `name` is one of the built-in components.
    #[must_use]
    pub fn is_builtin(name: &str) -> bool {
        let name = name.trim().to_lowercase();
        BUILTIN.iter().any(|(builtin, _)| *builtin == name)
    }

    /// Override the instance key used to embed the profile.
    #[must_use]
    pub fn with_profile_key(mut self, profile_key: impl Into<String>) -> Self {
        self.profile_key = profile_key.into();
        self
    }

    /// Override the primary tag field.
    #[must_use]
    pub fn with_tag_field(mut self, tag_field: impl Into<String>) -> Self {
        self.tag_field = tag_field.into();
        self
    }

    /// The tag used when the profile carries none.
    #[must_use]
    pub fn fallback_tag(&self) -> String {
        self.name.to_uppercase()
    }
}

impl Default for ComponentTarget {
    fn default() -> Self {
        Self::named("valve")
    }
}

impl fmt::Display for ComponentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
