use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    template::Verification,
    value::{Profile, ProfileValue},
};
use crate::validation::ValidationResult;

/// Lifecycle status of an instantiated requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Every placeholder was resolved.
    #[default]
    Draft,
    /// At least one placeholder awaits input.
    ReviewRequired,
}

/// The applicability rule that admitted a requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchedRule {
    /// The rule's conditions, as written in the template.
    pub conditions: Vec<String>,
    /// Always `true` for applicable requirements.
    pub matched: bool,
}

/// A requirement template that applied to the profile, with its text
/// resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstantiatedRequirement {
    /// Identifier copied from the template.
    pub id: String,
    /// Text with resolvable placeholders substituted.
    pub text: String,
    /// Requirement type copied from the template.
    #[serde(rename = "type")]
    pub kind: String,
    /// Verification descriptor copied from the template.
    pub verification: Verification,
    /// Provenance references copied from the template.
    pub provenance_refs: Vec<serde_json::Value>,
    /// [`Status::ReviewRequired`] iff `tbd_parameters` is non-empty.
    pub status: Status,
    /// Profile values substituted into the text.
    pub parameter_values: BTreeMap<String, ProfileValue>,
    /// Placeholders still present in `text`, in order of first appearance.
    pub tbd_parameters: Vec<String>,
    /// The rule that admitted this requirement.
    pub applicability: MatchedRule,
}

impl Default for InstantiatedRequirement {
    fn default() -> Self {
        Self {
            id: String::new(),
            text: String::new(),
            kind: "unknown".to_string(),
            verification: Verification::default(),
            provenance_refs: Vec::new(),
            status: Status::Draft,
            parameter_values: BTreeMap::new(),
            tbd_parameters: Vec::new(),
            applicability: MatchedRule::default(),
        }
    }
}

/// A requirement template that did not apply, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonApplicable {
    /// Identifier copied from the template.
    pub id: String,
    /// The rule's conditions, as written in the template.
    pub conditions: Vec<String>,
    /// Why the rule did not match.
    pub reasons: Vec<String>,
}

/// Counts over an instance's requirement lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of applicable requirements.
    pub applicable_count: usize,
    /// Number of non-applicable requirements.
    pub non_applicable_count: usize,
    /// Number of distinct unresolved parameter names across all applicable
    /// requirements.
    pub tbd_parameter_count: usize,
}

impl Summary {
    /// Compute the summary of the given lists.
    #[must_use]
    pub fn of(applicable: &[InstantiatedRequirement], non_applicable: &[NonApplicable]) -> Self {
        let tbd: BTreeSet<&str> = applicable
            .iter()
            .flat_map(|req| req.tbd_parameters.iter().map(String::as_str))
            .collect();

        Self {
            applicable_count: applicable.len(),
            non_applicable_count: non_applicable.len(),
            tbd_parameter_count: tbd.len(),
        }
    }
}

/// The generated requirements document for one profile against one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// `<TAG>-requirements`.
    pub instance_id: String,
    /// Identifier of the template library used.
    pub template_id: String,
    /// Generation time, UTC, second precision.
    pub generated_utc: DateTime<Utc>,
    /// The input profile, keyed by the component's profile key.
    #[serde(flatten)]
    pub profiles: BTreeMap<String, Profile>,
    /// Counts over the requirement lists.
    pub summary: Summary,
    /// Requirements that applied.
    pub applicable_requirements: Vec<InstantiatedRequirement>,
    /// Requirements that did not apply.
    pub non_applicable_requirements: Vec<NonApplicable>,
    /// Quality-gate result over `applicable_requirements`.
    pub validation: ValidationResult,
}

impl Instance {
    /// The embedded profile stored under `key`.
    #[must_use]
    pub fn profile(&self, key: &str) -> Option<&Profile> {
        self.profiles.get(key)
    }

    /// Whether the summary agrees with the requirement lists.
    #[must_use]
    pub fn summary_is_consistent(&self) -> bool {
        self.summary == Summary::of(&self.applicable_requirements, &self.non_applicable_requirements)
    }
}
