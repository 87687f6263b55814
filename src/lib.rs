//! Component Requirements Derivation
//!
//! Requirement templates are written once, in generic form, and carry an
//! applicability rule along with `{{placeholder}}` parameters. Given the
//! profile of a concrete component (a valve, a pump, ...), the [`Engine`]
//! decides which templates apply, fills in their parameters, and runs a set
//! of wording checks over the result.

pub mod domain;
pub use domain::{
    ComponentTarget, Config, Instance, InstantiatedRequirement, Profile, ProfileValue, Template,
};

pub mod derive;
pub use derive::{Engine, derive};

pub mod validation;
pub use validation::{
    Issue, IssueCode, OverallStatus, RuleSet, Severity, ValidationResult, Validator,
};

pub mod report;
pub use report::{Report, build_report};

pub mod storage;
pub use storage::{ExportError, LoadError};
