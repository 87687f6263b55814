use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::issue::{Issue, IssueCode, ValidationResult};
use crate::domain::{ConfigError, Instance, InstantiatedRequirement, placeholder::placeholder_names};

/// Wording heuristics applied to requirement text.
///
/// The defaults are tuned to "shall"-style obligation language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// The modal term that marks a mandatory obligation.
    pub obligation_term: String,

    /// Requirement types exempt from the obligation-term check.
    pub exempt_types: Vec<String>,

    /// Tokens whose presence suggests an ambiguous, non-atomic requirement.
    pub ambiguous_tokens: Vec<String>,

    /// How many obligation terms a single requirement may contain.
    pub max_obligations: usize,

    /// Whether to flag `<term> ... and ... <term>` constructions.
    pub check_conjunction: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            obligation_term: "shall".to_string(),
            exempt_types: vec!["programmatic".to_string()],
            ambiguous_tokens: vec!["and/or".to_string()],
            max_obligations: 1,
            check_conjunction: true,
        }
    }
}

impl RuleSet {
    /// Reject rule sets the validator cannot apply meaningfully.
    ///
    /// # Errors
    ///
    /// Returns an error if the obligation term is blank.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.obligation_term.trim().is_empty() {
            return Err(ConfigError::EmptyObligationTerm);
        }
        Ok(())
    }
}

/// Runs the quality checks over instantiated requirements.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: RuleSet,
    obligation: Regex,
    conjunction: Regex,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(RuleSet::default()).expect("default rule set always compiles")
    }
}

/// The fields of a requirement the checks read.
struct Checked<'a> {
    id: &'a str,
    text: &'a str,
    kind: &'a str,
    has_methods: bool,
    acceptance: &'a str,
    tbd_parameters: Vec<&'a str>,
}

impl<'a> From<&'a InstantiatedRequirement> for Checked<'a> {
    fn from(req: &'a InstantiatedRequirement) -> Self {
        Self {
            id: &req.id,
            text: &req.text,
            kind: &req.kind,
            has_methods: !req.verification.methods.is_empty(),
            acceptance: &req.verification.acceptance,
            tbd_parameters: req.tbd_parameters.iter().map(String::as_str).collect(),
        }
    }
}

impl<'a> Checked<'a> {
    /// Read an untyped entry leniently.
    ///
    /// Missing, null, and wrong-typed fields read as empty, except the text,
    /// which must be a string when present.
    fn from_value(entry: &'a Value) -> Result<Self, String> {
        let str_field = |value: Option<&'a Value>| value.and_then(Value::as_str).unwrap_or_default();

        let text = match entry.get("text") {
            None | Some(Value::Null) => "",
            Some(Value::String(text)) => text.as_str(),
            Some(other) => return Err(format!("text must be a string, found {other}")),
        };
        let verification = entry.get("verification");

        Ok(Self {
            id: str_field(entry.get("id")),
            text,
            kind: str_field(entry.get("type")),
            has_methods: verification
                .and_then(|v| v.get("method"))
                .and_then(Value::as_array)
                .is_some_and(|methods| !methods.is_empty()),
            acceptance: str_field(verification.and_then(|v| v.get("acceptance"))),
            tbd_parameters: entry
                .get("tbd_parameters")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default(),
        })
    }
}

impl Validator {
    /// Compile a rule set.
    ///
    /// # Errors
    ///
    /// Returns an error if the obligation term is blank, or produces a
    /// pattern that is too large to compile.
    pub fn new(rules: RuleSet) -> Result<Self, ConfigError> {
        rules.check()?;

        let term = regex::escape(rules.obligation_term.trim());
        let obligation = RegexBuilder::new(&format!(r"\b{term}\b"))
            .case_insensitive(true)
            .build()?;
        let conjunction = RegexBuilder::new(&format!(r"\b{term}\b.*\band\b.*\b{term}\b"))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            rules,
            obligation,
            conjunction,
        })
    }

    /// The rule set this validator was built from.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run every per-requirement check.
    ///
    /// Checks are independent; all of them run regardless of earlier
    /// findings.
    #[must_use]
    pub fn validate_requirement(&self, req: &InstantiatedRequirement) -> Vec<Issue> {
        self.check(&Checked::from(req))
    }

    /// Validate a set of applicable requirements.
    #[must_use]
    pub fn validate_requirements(&self, requirements: &[InstantiatedRequirement]) -> ValidationResult {
        let issues = requirements
            .iter()
            .flat_map(|req| self.validate_requirement(req))
            .collect();
        let result = ValidationResult::from_issues(issues);
        debug!(
            requirements = requirements.len(),
            errors = result.error_count,
            warnings = result.warning_count,
            "validated requirements"
        );
        result
    }

    /// Validate the applicable requirements of an instance.
    #[instrument(level = "debug", skip_all, fields(instance = %instance.instance_id))]
    #[must_use]
    pub fn validate_instance(&self, instance: &Instance) -> ValidationResult {
        self.validate_requirements(&instance.applicable_requirements)
    }

    /// Validate an instance document in its untyped JSON form.
    ///
    /// Shape problems are reported as error-severity issues rather than
    /// failing: a non-list `applicable_requirements`, non-object entries, and
    /// entries whose text is not a string. Fields the checks read are taken
    /// leniently, and every other field is ignored.
    #[instrument(level = "debug", skip_all)]
    #[must_use]
    pub fn validate_document(&self, document: &Value) -> ValidationResult {
        let mut issues = Vec::new();

        match document.get("applicable_requirements") {
            None | Some(Value::Null) => {}
            Some(Value::Array(entries)) => {
                for entry in entries {
                    issues.extend(self.validate_entry(entry));
                }
            }
            Some(_) => issues.push(Issue::error(
                IssueCode::ApplicableNotList,
                "applicable_requirements must be a list.",
            )),
        }

        ValidationResult::from_issues(issues)
    }

    fn validate_entry(&self, entry: &Value) -> Vec<Issue> {
        if !entry.is_object() {
            return vec![Issue::error(
                IssueCode::RequirementNotObject,
                "Each applicable requirement must be an object.",
            )];
        }

        match Checked::from_value(entry) {
            Ok(checked) => self.check(&checked),
            Err(reason) => {
                let id = entry.get("id").and_then(Value::as_str).unwrap_or_default();
                vec![
                    Issue::error(
                        IssueCode::RequirementMalformed,
                        format!("Applicable requirement could not be read: {reason}"),
                    )
                    .for_requirement(id),
                ]
            }
        }
    }

    fn check(&self, req: &Checked<'_>) -> Vec<Issue> {
        let mut issues = Vec::new();

        Self::check_verification(req, &mut issues);
        self.check_obligation(req, &mut issues);
        Self::check_placeholders(req, &mut issues);
        self.check_atomicity(req.text, &mut issues);

        issues
            .into_iter()
            .map(|issue| issue.for_requirement(req.id))
            .collect()
    }

    fn check_verification(req: &Checked<'_>, issues: &mut Vec<Issue>) {
        if !req.has_methods {
            issues.push(Issue::error(
                IssueCode::VerificationMethodMissing,
                "Verification.method must be a non-empty list.",
            ));
        }
        if req.acceptance.trim().is_empty() {
            issues.push(Issue::error(
                IssueCode::VerificationAcceptanceMissing,
                "Verification.acceptance must be a non-empty string.",
            ));
        }
    }

    fn check_obligation(&self, req: &Checked<'_>, issues: &mut Vec<Issue>) {
        if self.rules.exempt_types.iter().any(|exempt| exempt == req.kind) {
            return;
        }
        if !self.obligation.is_match(req.text) {
            issues.push(Issue::warning(
                IssueCode::ShallNotFound,
                format!(
                    "Requirement text does not contain '{}'; confirm requirement wording.",
                    self.rules.obligation_term
                ),
            ));
        }
    }

    /// Placeholders left in the text must be tracked as TBD parameters.
    fn check_placeholders(req: &Checked<'_>, issues: &mut Vec<Issue>) {
        let remaining = placeholder_names(req.text);
        if remaining.is_empty() {
            return;
        }

        let tracked: BTreeSet<&str> = req.tbd_parameters.iter().copied().collect();
        let untracked: Vec<&str> = remaining
            .iter()
            .map(String::as_str)
            .filter(|name| !tracked.contains(name))
            .collect();

        if untracked.is_empty() {
            let remaining: Vec<&String> = remaining.iter().collect();
            issues.push(Issue::warning(
                IssueCode::PlaceholderTbd,
                format!(
                    "Requirement has unresolved placeholders that require inputs: {remaining:?}"
                ),
            ));
        } else {
            issues.push(Issue::error(
                IssueCode::PlaceholderUntracked,
                format!("Unresolved placeholders not tracked in tbd_parameters: {untracked:?}"),
            ));
        }
    }

    fn check_atomicity(&self, text: &str, issues: &mut Vec<Issue>) {
        let lowered = text.to_lowercase();
        let term = &self.rules.obligation_term;

        for token in &self.rules.ambiguous_tokens {
            if lowered.contains(&token.to_lowercase()) {
                issues.push(Issue::warning(
                    IssueCode::AtomicityAndOr,
                    format!("Requirement contains '{token}' which is often ambiguous; consider splitting."),
                ));
            }
        }

        let count = self.obligation.find_iter(text).count();
        if count > self.rules.max_obligations {
            issues.push(Issue::warning(
                IssueCode::AtomicityMultiShall,
                format!("Requirement contains {count} occurrences of '{term}'; may be compound."),
            ));
        }

        if self.rules.check_conjunction && self.conjunction.is_match(text) {
            issues.push(Issue::warning(
                IssueCode::AtomicityConjunction,
                format!(
                    "Requirement may be compound (contains '{term} ... and ... {term}'); consider splitting."
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::{
        domain::Verification,
        validation::{OverallStatus, Severity},
    };

    fn requirement(text: &str, tbd: &[&str]) -> InstantiatedRequirement {
        InstantiatedRequirement {
            id: "V-001".to_string(),
            text: text.to_string(),
            kind: "functional".to_string(),
            verification: Verification {
                methods: vec!["test".to_string()],
                acceptance: "No leakage observed.".to_string(),
            },
            tbd_parameters: tbd.iter().map(ToString::to_string).collect(),
            ..InstantiatedRequirement::default()
        }
    }

    fn codes(issues: &[Issue]) -> Vec<IssueCode> {
        issues.iter().map(|issue| issue.code.clone()).collect()
    }

    #[test]
    fn clean_requirement_has_no_issues() {
        let req = requirement("The valve shall close within 5 s.", &[]);
        assert!(Validator::default().validate_requirement(&req).is_empty());
    }

    #[test]
    fn missing_verification_yields_two_errors_and_fails() {
        let mut req = requirement("The valve shall close within 5 s.", &[]);
        req.verification = Verification::default();

        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(
            codes(&issues),
            [
                IssueCode::VerificationMethodMissing,
                IssueCode::VerificationAcceptanceMissing
            ]
        );
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
        assert!(issues.iter().all(|i| i.requirement_id.as_deref() == Some("V-001")));

        let result = Validator::default().validate_requirements(&[req]);
        assert_eq!(result.overall_status, OverallStatus::Fail);
        assert_eq!(result.error_count, 2);
    }

    #[test]
    fn blank_acceptance_is_missing() {
        let mut req = requirement("The valve shall close.", &[]);
        req.verification.acceptance = "   ".to_string();
        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(codes(&issues), [IssueCode::VerificationAcceptanceMissing]);
    }

    #[test]
    fn tracked_placeholder_is_a_warning() {
        let req = requirement("The valve shall withstand {{dp_max}} without damage.", &["dp_max"]);
        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(codes(&issues), [IssueCode::PlaceholderTbd]);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn untracked_placeholder_is_an_error() {
        let req = requirement("The valve shall withstand {{dp_max}} without damage.", &[]);
        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(codes(&issues), [IssueCode::PlaceholderUntracked]);
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(issues[0].message.contains("dp_max"));
    }

    #[test]
    fn untracked_message_lists_only_untracked_names() {
        let req = requirement("The valve shall hold {{a}} at {{b}}.", &["a"]);
        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(
            issues[0].message,
            r#"Unresolved placeholders not tracked in tbd_parameters: ["b"]"#
        );
    }

    #[test_case("The valve closes on demand.", "functional", true; "missing shall")]
    #[test_case("The valve SHALL close.", "functional", false; "case insensitive")]
    #[test_case("The marshall closes the valve.", "functional", true; "word bounded")]
    #[test_case("Quality records are retained.", "programmatic", false; "exempt type")]
    fn obligation_term(text: &str, kind: &str, flagged: bool) {
        let mut req = requirement(text, &[]);
        req.kind = kind.to_string();
        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(codes(&issues).contains(&IssueCode::ShallNotFound), flagged);
    }

    #[test_case("The valve shall open and/or close."; "lowercase")]
    #[test_case("Open AND/OR close."; "uppercase without shall")]
    fn andor_always_flagged(text: &str) {
        let issues = Validator::default().validate_requirement(&requirement(text, &[]));
        assert!(codes(&issues).contains(&IssueCode::AtomicityAndOr));
    }

    #[test]
    fn multiple_obligations_are_counted() {
        let req = requirement("The valve shall open. The valve shall close.", &[]);
        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(codes(&issues), [IssueCode::AtomicityMultiShall]);
        assert!(issues[0].message.contains("2 occurrences"));
    }

    #[test]
    fn conjunction_of_obligations() {
        let req = requirement("The valve shall open and the actuator shall stop.", &[]);
        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(
            codes(&issues),
            [
                IssueCode::AtomicityMultiShall,
                IssueCode::AtomicityConjunction
            ]
        );
    }

    #[test]
    fn custom_rules() {
        let rules = RuleSet {
            obligation_term: "must".to_string(),
            ambiguous_tokens: vec!["etc.".to_string()],
            max_obligations: 2,
            check_conjunction: false,
            ..RuleSet::default()
        };
        let validator = Validator::new(rules).unwrap();

        let req = requirement("The pump must start and must stop, etc.", &[]);
        let issues = validator.validate_requirement(&req);
        assert_eq!(codes(&issues), [IssueCode::AtomicityAndOr]);

        let req = requirement("The pump shall start.", &[]);
        let issues = validator.validate_requirement(&req);
        assert_eq!(codes(&issues), [IssueCode::ShallNotFound]);
        assert!(issues[0].message.contains("'must'"));
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "whitespace")]
    fn blank_obligation_term_is_rejected(term: &str) {
        let rules = RuleSet {
            obligation_term: term.to_string(),
            ..RuleSet::default()
        };
        assert!(matches!(
            Validator::new(rules),
            Err(ConfigError::EmptyObligationTerm)
        ));
    }

    #[test]
    fn conjunction_does_not_span_lines() {
        let req = requirement("The valve shall open and close.\nThe actuator shall stop.", &[]);
        let issues = Validator::default().validate_requirement(&req);
        assert_eq!(codes(&issues), [IssueCode::AtomicityMultiShall]);
    }

    #[test]
    fn validate_instance_covers_applicable_requirements() {
        let mut instance: Instance = serde_json::from_value(json!({
            "instance_id": "V-101-requirements",
            "template_id": "t",
            "generated_utc": "2025-01-01T00:00:00Z",
            "summary": {"applicable_count": 1, "non_applicable_count": 0, "tbd_parameter_count": 0},
            "applicable_requirements": [],
            "non_applicable_requirements": [],
            "validation": {
                "overall_status": "pass", "error_count": 0, "warning_count": 0,
                "info_count": 0, "issue_count": 0, "issues": []
            }
        }))
        .unwrap();
        instance.applicable_requirements = vec![requirement("The valve opens.", &[])];

        let result = Validator::default().validate_instance(&instance);
        assert_eq!(codes(&result.issues), [IssueCode::ShallNotFound]);
        assert!(result.passed());
    }

    #[test]
    fn document_with_non_list_requirements() {
        let result = Validator::default()
            .validate_document(&json!({"applicable_requirements": {"id": "V-001"}}));
        assert_eq!(result.overall_status, OverallStatus::Fail);
        assert_eq!(result.issues[0].code, IssueCode::ApplicableNotList);
        assert_eq!(result.issue_count, 1);
    }

    #[test]
    fn document_with_non_object_entries() {
        let result = Validator::default().validate_document(&json!({
            "applicable_requirements": [
                "not an object",
                {
                    "id": "V-002",
                    "text": "The valve shall close.",
                    "verification": {"method": ["test"], "acceptance": "Closes."}
                },
                {"id": "V-003", "text": 42, "verification": {"method": ["test"]}}
            ]
        }));

        assert_eq!(
            codes(&result.issues),
            [
                IssueCode::RequirementNotObject,
                IssueCode::RequirementMalformed
            ]
        );
        assert_eq!(result.issues[0].requirement_id, None);
        assert_eq!(result.issues[1].requirement_id.as_deref(), Some("V-003"));
    }

    #[test]
    fn document_entries_are_read_leniently() {
        let result = Validator::default().validate_document(&json!({
            "applicable_requirements": [
                {
                    "id": "A",
                    "status": "approved",
                    "text": "The valve opens and/or closes.",
                    "verification": {"method": ["test"], "acceptance": "Operates."}
                },
                {
                    "id": "B",
                    "text": null,
                    "tbd_parameters": null,
                    "verification": {"method": ["inspection"], "acceptance": "Present."}
                },
                {
                    "id": "C",
                    "text": "The valve holds {{x}}.",
                    "verification": {"method": "test", "acceptance": ""}
                }
            ]
        }));

        let by_id = |id: &str| -> Vec<IssueCode> {
            result
                .issues
                .iter()
                .filter(|issue| issue.requirement_id.as_deref() == Some(id))
                .map(|issue| issue.code.clone())
                .collect()
        };

        assert_eq!(
            by_id("A"),
            [IssueCode::ShallNotFound, IssueCode::AtomicityAndOr]
        );
        assert_eq!(by_id("B"), [IssueCode::ShallNotFound]);
        assert_eq!(
            by_id("C"),
            [
                IssueCode::VerificationMethodMissing,
                IssueCode::VerificationAcceptanceMissing,
                IssueCode::ShallNotFound,
                IssueCode::PlaceholderUntracked
            ]
        );
        assert_eq!(result.error_count, 3);
        assert_eq!(result.warning_count, 4);
    }

    #[test]
    fn document_and_typed_validation_agree() {
        let reqs = vec![
            requirement("The valve shall hold {{dp_max}}.", &["dp_max"]),
            requirement("The valve opens.", &[]),
        ];
        let document = json!({"applicable_requirements": serde_json::to_value(&reqs).unwrap()});

        let validator = Validator::default();
        assert_eq!(
            validator.validate_document(&document),
            validator.validate_requirements(&reqs)
        );
    }

    #[test]
    fn document_without_requirements_passes() {
        let result = Validator::default().validate_document(&json!({}));
        assert!(result.passed());
        assert_eq!(result.issue_count, 0);
    }
}
