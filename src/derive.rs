//! Derivation of a requirements instance from a template and a profile.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, instrument};

use crate::{
    domain::{
        ComponentTarget, Config, ConfigError, Instance, InstantiatedRequirement, MatchedRule,
        NonApplicable, Profile, RequirementTemplate, Status, Summary, TagConvention, Template,
        instantiate,
    },
    validation::{ValidationResult, Validator},
};

/// Derives instances from templates and validates them.
///
/// An engine is immutable once built and can be shared freely between
/// threads; each call to [`Engine::derive`] is independent.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    validator: Validator,
    convention: TagConvention,
}

/// The outcome of applying one template to a profile.
enum Outcome {
    Applicable(InstantiatedRequirement),
    NotApplicable(NonApplicable),
}

impl Engine {
    /// Build an engine from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured rule set cannot be compiled.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            validator: Validator::new(config.rules.clone())?,
            convention: config.convention.clone(),
        })
    }

    /// The validator applied to every derived instance.
    #[must_use]
    pub const fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The tag convention used to name instances.
    #[must_use]
    pub const fn convention(&self) -> &TagConvention {
        &self.convention
    }

    /// Derive an instance, timestamped now.
    #[must_use]
    pub fn derive(&self, template: &Template, profile: &Profile, target: &ComponentTarget) -> Instance {
        self.derive_at(template, profile, target, Utc::now())
    }

    /// Derive an instance with an explicit generation time.
    ///
    /// Every requirement in the template is evaluated in library order.
    /// Requirements whose applicability rule matches have their text
    /// resolved against the profile; the rest are recorded along with the
    /// reasons they did not apply. The finished instance is validated before
    /// it is returned.
    #[instrument(skip_all, fields(template = %template.template_id, component = %target))]
    #[must_use]
    pub fn derive_at(
        &self,
        template: &Template,
        profile: &Profile,
        target: &ComponentTarget,
        generated: DateTime<Utc>,
    ) -> Instance {
        let mut applicable = Vec::new();
        let mut non_applicable = Vec::new();

        for requirement in template.requirements() {
            match apply(requirement, profile) {
                Outcome::Applicable(req) => applicable.push(req),
                Outcome::NotApplicable(record) => non_applicable.push(record),
            }
        }

        let tag = self
            .convention
            .tag_value(profile, Some(&target.tag_field))
            .unwrap_or_else(|| target.fallback_tag());

        let mut instance = Instance {
            instance_id: format!("{tag}-requirements"),
            template_id: template.template_id.clone(),
            generated_utc: generated.trunc_subsecs(0),
            profiles: BTreeMap::from([(target.profile_key.clone(), profile.clone())]),
            summary: Summary::of(&applicable, &non_applicable),
            applicable_requirements: applicable,
            non_applicable_requirements: non_applicable,
            validation: ValidationResult::default(),
        };
        instance.validation = self.validator.validate_instance(&instance);

        info!(
            applicable = instance.summary.applicable_count,
            non_applicable = instance.summary.non_applicable_count,
            tbd = instance.summary.tbd_parameter_count,
            status = %instance.validation.overall_status,
            "derived instance"
        );

        instance
    }
}

/// Derive an instance with the default rules and naming convention.
#[must_use]
pub fn derive(template: &Template, profile: &Profile, target: &ComponentTarget) -> Instance {
    Engine::default().derive(template, profile, target)
}

fn apply(requirement: &RequirementTemplate, profile: &Profile) -> Outcome {
    let conditions = &requirement.applicability.when;
    let evaluation = requirement.applicability.evaluate(profile);

    if !evaluation.matched {
        debug!(id = %requirement.id, reasons = ?evaluation.reasons, "not applicable");
        let reasons = if evaluation.reasons.is_empty() {
            vec!["Not applicable".to_string()]
        } else {
            evaluation.reasons
        };
        return Outcome::NotApplicable(NonApplicable {
            id: requirement.id.clone(),
            conditions: conditions.clone(),
            reasons,
        });
    }

    let resolved = instantiate(&requirement.text, profile);
    let status = if resolved.unresolved.is_empty() {
        Status::Draft
    } else {
        Status::ReviewRequired
    };
    debug!(id = %requirement.id, ?status, "applicable");

    Outcome::Applicable(InstantiatedRequirement {
        id: requirement.id.clone(),
        text: resolved.text,
        kind: requirement.kind.clone(),
        verification: requirement.verification.clone(),
        provenance_refs: requirement.provenance_refs.clone(),
        status,
        parameter_values: resolved.used,
        tbd_parameters: resolved.unresolved,
        applicability: MatchedRule {
            conditions: conditions.clone(),
            matched: true,
        },
    })
}
