//! Domain models for requirement derivation.
//!
//! This module contains the profile value type, the template library model,
//! the applicability condition language, placeholder resolution, and the
//! generated instance document.

/// Applicability conditions and rules.
pub mod condition;
pub use condition::{Applicability, Comparison, Condition, ConditionError, Evaluation};

mod component;
pub use component::ComponentTarget;

mod config;
pub use config::{Config, ConfigError};

mod instance;
pub use instance::{
    Instance, InstantiatedRequirement, MatchedRule, NonApplicable, Status, Summary,
};

/// Placeholder resolution in requirement text.
pub mod placeholder;
pub use placeholder::{Instantiation, instantiate};

mod tag;
pub use tag::TagConvention;

mod template;
pub use template::{RequirementSet, RequirementTemplate, Template, Verification};

mod value;
pub use value::{Profile, ProfileValue, lookup};
