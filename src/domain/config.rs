use std::path::Path;

use serde::{Deserialize, Serialize};

use super::tag::TagConvention;
use crate::validation::RuleSet;

/// Configuration for derivation and quality validation.
///
/// Holds the wording heuristics applied by the validator and the naming
/// convention used to locate tags. Both default to the conventions of the
/// bundled component libraries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Quality heuristics applied to every applicable requirement.
    pub rules: RuleSet,

    /// How tag fields and embedded profiles are recognised.
    pub convention: TagConvention,
}

/// Errors that can occur while loading a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid configuration.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A rule could not be compiled into a pattern.
    #[error("Invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The obligation term is empty or whitespace.
    #[error("Invalid rule set: obligation_term must not be blank")]
    EmptyObligationTerm,
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the TOML content is
    /// invalid, or if the rule set is unusable.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.rules.check()?;
        Ok(config)
    }

    /// Loads the configuration if the file exists, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        rules: RuleSet,

        #[serde(default)]
        convention: TagConvention,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 { rules, convention } => Self { rules, convention },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            rules: config.rules,
            convention: config.convention,
        }
    }
}
