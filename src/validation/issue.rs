use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

/// How serious a validation issue is.
///
/// Ordering follows precedence: errors first, unknown severities last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks a `pass` classification.
    Error,
    /// Needs attention, does not block.
    Warning,
    /// Informational.
    Info,
    /// A severity this version does not recognise.
    #[serde(other)]
    Unknown,
}

impl Severity {
    /// The lowercase name used in serialized output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a validation check.
///
/// Codes this version does not produce are kept verbatim as
/// [`IssueCode::Other`], so instances written by other tools still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueCode {
    /// `applicable_requirements` is not a list.
    ApplicableNotList,
    /// An applicable requirement entry is not an object.
    RequirementNotObject,
    /// An applicable requirement object cannot be read as a requirement.
    RequirementMalformed,
    /// The verification method list is empty.
    VerificationMethodMissing,
    /// The acceptance criteria are blank.
    VerificationAcceptanceMissing,
    /// The text lacks the obligation term.
    ShallNotFound,
    /// Placeholders remain that are not listed as TBD.
    PlaceholderUntracked,
    /// Placeholders remain and are all listed as TBD.
    PlaceholderTbd,
    /// The text contains an ambiguous token such as `and/or`.
    AtomicityAndOr,
    /// The text contains the obligation term more than allowed.
    AtomicityMultiShall,
    /// The text joins two obligations with a conjunction.
    AtomicityConjunction,
    /// A code not recognised by this version.
    Other(String),
}

impl IssueCode {
    const KNOWN: [Self; 11] = [
        Self::ApplicableNotList,
        Self::RequirementNotObject,
        Self::RequirementMalformed,
        Self::VerificationMethodMissing,
        Self::VerificationAcceptanceMissing,
        Self::ShallNotFound,
        Self::PlaceholderUntracked,
        Self::PlaceholderTbd,
        Self::AtomicityAndOr,
        Self::AtomicityMultiShall,
        Self::AtomicityConjunction,
    ];

    /// The stable code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ApplicableNotList => "INSTANCE_APPLICABLE_NOT_LIST",
            Self::RequirementNotObject => "INSTANCE_REQ_NOT_OBJECT",
            Self::RequirementMalformed => "INSTANCE_REQ_MALFORMED",
            Self::VerificationMethodMissing => "REQ_VERIFICATION_METHOD_MISSING",
            Self::VerificationAcceptanceMissing => "REQ_VERIFICATION_ACCEPTANCE_MISSING",
            Self::ShallNotFound => "REQ_SHALL_NOT_FOUND",
            Self::PlaceholderUntracked => "REQ_PLACEHOLDER_UNTRACKED",
            Self::PlaceholderTbd => "REQ_PLACEHOLDER_TBD",
            Self::AtomicityAndOr => "REQ_ATOMICITY_ANDOR",
            Self::AtomicityMultiShall => "REQ_ATOMICITY_MULTI_SHALL",
            Self::AtomicityConjunction => "REQ_ATOMICITY_CONJUNCTION",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for IssueCode {
    fn from(code: String) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|known| known.as_str() == code)
            .unwrap_or(Self::Other(code))
    }
}

impl From<IssueCode> for String {
    fn from(code: IssueCode) -> Self {
        match code {
            IssueCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialOrd for IssueCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Codes order lexically by their string form.
impl Ord for IssueCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// How serious the finding is.
    pub severity: Severity,
    /// Which check produced it.
    pub code: IssueCode,
    /// Human-readable explanation.
    pub message: String,
    /// The requirement the finding is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<String>,
}

impl Issue {
    /// An error-severity issue.
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// A warning-severity issue.
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    fn new(severity: Severity, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            requirement_id: None,
        }
    }

    /// Attach the owning requirement.
    ///
    /// Blank identifiers are ignored.
    #[must_use]
    pub fn for_requirement(mut self, id: &str) -> Self {
        if !id.is_empty() {
            self.requirement_id = Some(id.to_string());
        }
        self
    }
}

/// Overall outcome of validating an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// No error-severity issues.
    #[default]
    Pass,
    /// At least one error-severity issue.
    Fail,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        })
    }
}

/// The aggregated result of validating an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `fail` iff `error_count > 0`.
    pub overall_status: OverallStatus,
    /// Number of error-severity issues.
    pub error_count: usize,
    /// Number of warning-severity issues.
    pub warning_count: usize,
    /// Number of info-severity issues.
    pub info_count: usize,
    /// Total number of issues.
    pub issue_count: usize,
    /// Every issue, in the order checks produced them.
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    /// Tally a list of issues.
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();
        let error_count = count(Severity::Error);
        let warning_count = count(Severity::Warning);
        let info_count = count(Severity::Info);

        Self {
            overall_status: if error_count > 0 {
                OverallStatus::Fail
            } else {
                OverallStatus::Pass
            },
            error_count,
            warning_count,
            info_count,
            issue_count: issues.len(),
            issues,
        }
    }

    /// Whether the result passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.overall_status == OverallStatus::Pass
    }
}
