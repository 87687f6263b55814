use serde::{Deserialize, Serialize};

use super::condition::Applicability;

fn unknown_template() -> String {
    "unknown_template".to_string()
}

fn unknown_type() -> String {
    "unknown".to_string()
}

/// A requirement template library.
///
/// Templates are loaded once per run and never modified by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Identifier of the library, copied onto every instance.
    #[serde(default = "unknown_template")]
    pub template_id: String,

    /// The named requirement sets, in library order.
    #[serde(default)]
    pub requirement_sets: Vec<RequirementSet>,
}

impl Template {
    /// Iterate over every requirement across every set, in library order.
    pub fn requirements(&self) -> impl Iterator<Item = &RequirementTemplate> {
        self.requirement_sets
            .iter()
            .flat_map(|set| set.requirements.iter())
    }
}

/// A named group of requirement templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    /// The set's name, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The templates in this set.
    #[serde(default)]
    pub requirements: Vec<RequirementTemplate>,
}

/// A single requirement template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementTemplate {
    /// Stable identifier.
    pub id: String,

    /// Requirement type tag (e.g. `functional`, `programmatic`).
    #[serde(rename = "type", default = "unknown_type")]
    pub kind: String,

    /// Requirement text, possibly containing `{{name}}` placeholders.
    #[serde(default)]
    pub text: String,

    /// How the requirement is to be verified.
    #[serde(default)]
    pub verification: Verification,

    /// When this requirement applies.
    #[serde(default)]
    pub applicability: Applicability,

    /// Provenance references, carried through verbatim.
    #[serde(default)]
    pub provenance_refs: Vec<serde_json::Value>,
}

/// A verification descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Verification method names (e.g. `test`, `analysis`).
    #[serde(rename = "method", default)]
    pub methods: Vec<String>,

    /// Acceptance criteria.
    #[serde(default)]
    pub acceptance: String,
}
