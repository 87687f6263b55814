//! Quality validation of instantiated requirements.
//!
//! Checks are deterministic wording and structure heuristics. Findings are
//! data: validation always returns a [`ValidationResult`], never an error.

mod issue;
pub use issue::{Issue, IssueCode, OverallStatus, Severity, ValidationResult};

mod rules;
pub use rules::{RuleSet, Validator};
