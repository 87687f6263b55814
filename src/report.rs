//! Grouped summary of an instance's validation issues.

use std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Instance, TagConvention},
    validation::{IssueCode, OverallStatus, Severity, ValidationResult},
};

const MAX_EXAMPLES: usize = 3;

/// Issue counts carried over from the validation result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Number of error-severity issues.
    pub error_count: usize,
    /// Number of warning-severity issues.
    pub warning_count: usize,
    /// Number of info-severity issues.
    pub info_count: usize,
    /// Total number of issues.
    pub issue_count: usize,
}

impl From<&ValidationResult> for Counts {
    fn from(validation: &ValidationResult) -> Self {
        Self {
            error_count: validation.error_count,
            warning_count: validation.warning_count,
            info_count: validation.info_count,
            issue_count: validation.issue_count,
        }
    }
}

/// All issues sharing a severity and code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueGroup {
    /// Severity shared by the group.
    pub severity: Severity,
    /// Code shared by the group.
    pub code: IssueCode,
    /// Number of issues in the group.
    pub count: usize,
    /// Distinct owning requirement identifiers, sorted.
    pub requirement_ids: Vec<String>,
    /// Up to three distinct messages, in the order first seen.
    pub message_examples: Vec<String>,
}

/// A read-only, grouped view over an instance's validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Identifier of the instance.
    pub instance_id: String,
    /// Identifier of the template library.
    pub template_id: String,
    /// Best-effort component tag found in the embedded profile.
    pub component_tag: Option<String>,
    /// When the instance was generated.
    pub generated_utc: DateTime<Utc>,
    /// Overall validation outcome.
    pub overall_status: OverallStatus,
    /// Issue counts per severity.
    pub counts: Counts,
    /// Issues grouped by severity then code.
    pub by_code: Vec<IssueGroup>,
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    requirement_ids: BTreeSet<String>,
    message_examples: Vec<String>,
}

impl Report {
    /// Build a report using the default tag convention.
    #[must_use]
    pub fn build(instance: &Instance) -> Self {
        Self::build_with(instance, &TagConvention::default())
    }

    /// Build a report, locating the component tag with `convention`.
    ///
    /// The tag is for display only and has no bearing on the outcome.
    #[must_use]
    pub fn build_with(instance: &Instance, convention: &TagConvention) -> Self {
        let validation = &instance.validation;

        Self {
            instance_id: instance.instance_id.clone(),
            template_id: instance.template_id.clone(),
            component_tag: convention.tag_from_embedded(&instance.profiles),
            generated_utc: instance.generated_utc,
            overall_status: validation.overall_status,
            counts: Counts::from(validation),
            by_code: group(validation),
        }
    }

    /// Total number of issues across all groups.
    #[must_use]
    pub fn grouped_issue_count(&self) -> usize {
        self.by_code.iter().map(|group| group.count).sum()
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }

    /// Write the grouped table as CSV, one row per group.
    ///
    /// Columns are `severity, code, count, requirement_ids,
    /// message_examples`; identifiers are joined with `;` and messages with
    /// ` | `.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "severity",
            "code",
            "count",
            "requirement_ids",
            "message_examples",
        ])?;
        for group in &self.by_code {
            let count = group.count.to_string();
            let ids = group.requirement_ids.join(";");
            let examples = group.message_examples.join(" | ");
            csv.write_record([
                group.severity.as_str(),
                group.code.as_str(),
                count.as_str(),
                ids.as_str(),
                examples.as_str(),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }
}

/// Build a report with the default tag convention.
#[must_use]
pub fn build_report(instance: &Instance) -> Report {
    Report::build(instance)
}

fn group(validation: &ValidationResult) -> Vec<IssueGroup> {
    let mut groups: BTreeMap<(Severity, IssueCode), Accumulator> = BTreeMap::new();

    for issue in &validation.issues {
        let acc = groups.entry((issue.severity, issue.code.clone())).or_default();
        acc.count += 1;
        if let Some(id) = issue.requirement_id.as_ref().filter(|id| !id.is_empty()) {
            acc.requirement_ids.insert(id.clone());
        }
        if !issue.message.is_empty()
            && acc.message_examples.len() < MAX_EXAMPLES
            && !acc.message_examples.contains(&issue.message)
        {
            acc.message_examples.push(issue.message.clone());
        }
    }

    groups
        .into_iter()
        .map(|((severity, code), acc)| IssueGroup {
            severity,
            code,
            count: acc.count,
            requirement_ids: acc.requirement_ids.into_iter().collect(),
            message_examples: acc.message_examples,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::{
        domain::{ComponentTarget, Profile, Template},
        derive::Engine,
        validation::Issue,
    };

    fn instance_with(issues: Vec<Issue>) -> Instance {
        let template: Template = serde_json::from_value(json!({"template_id": "t"})).unwrap();
        let profile: Profile = serde_json::from_value(json!({"valve_tag": "V-101"})).unwrap();
        let mut instance = Engine::default().derive_at(
            &template,
            &profile,
            &ComponentTarget::default(),
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        );
        instance.validation = ValidationResult::from_issues(issues);
        instance
    }

    fn sample() -> Instance {
        instance_with(vec![
            Issue::warning(IssueCode::ShallNotFound, "no shall").for_requirement("V-002"),
            Issue::error(IssueCode::VerificationMethodMissing, "no method").for_requirement("V-003"),
            Issue::warning(IssueCode::AtomicityAndOr, "and/or").for_requirement("V-001"),
            Issue::warning(IssueCode::ShallNotFound, "no shall").for_requirement("V-001"),
            Issue::error(IssueCode::ApplicableNotList, "not a list"),
            Issue {
                severity: Severity::Info,
                code: IssueCode::PlaceholderTbd,
                message: "fyi".to_string(),
                requirement_id: Some("V-004".to_string()),
            },
        ])
    }

    #[test]
    fn groups_are_sorted_by_severity_then_code() {
        let report = Report::build(&sample());
        let keys: Vec<_> = report
            .by_code
            .iter()
            .map(|g| (g.severity, g.code.as_str()))
            .collect();
        assert_eq!(
            keys,
            [
                (Severity::Error, "INSTANCE_APPLICABLE_NOT_LIST"),
                (Severity::Error, "REQ_VERIFICATION_METHOD_MISSING"),
                (Severity::Warning, "REQ_ATOMICITY_ANDOR"),
                (Severity::Warning, "REQ_SHALL_NOT_FOUND"),
                (Severity::Info, "REQ_PLACEHOLDER_TBD"),
            ]
        );
    }

    #[test]
    fn group_collects_ids_and_distinct_examples() {
        let report = Report::build(&sample());
        let shall = report
            .by_code
            .iter()
            .find(|g| g.code == IssueCode::ShallNotFound)
            .unwrap();
        assert_eq!(shall.count, 2);
        assert_eq!(shall.requirement_ids, ["V-001", "V-002"]);
        assert_eq!(shall.message_examples, ["no shall"]);

        let structural = &report.by_code[0];
        assert!(structural.requirement_ids.is_empty());
    }

    #[test]
    fn examples_are_capped_at_three() {
        let issues = (0..5)
            .map(|i| Issue::warning(IssueCode::AtomicityMultiShall, format!("message {i}")))
            .collect();
        let report = Report::build(&instance_with(issues));
        assert_eq!(report.by_code[0].count, 5);
        assert_eq!(
            report.by_code[0].message_examples,
            ["message 0", "message 1", "message 2"]
        );
    }

    #[test]
    fn carries_instance_metadata() {
        let report = Report::build(&sample());
        assert_eq!(report.instance_id, "V-101-requirements");
        assert_eq!(report.template_id, "t");
        assert_eq!(report.component_tag.as_deref(), Some("V-101"));
        assert_eq!(report.overall_status, OverallStatus::Fail);
        assert_eq!(
            report.counts,
            Counts {
                error_count: 2,
                warning_count: 3,
                info_count: 1,
                issue_count: 6
            }
        );
    }

    #[test]
    fn grouped_total_matches_issue_count() {
        let instance = sample();
        let report = Report::build(&instance);
        assert_eq!(report.grouped_issue_count(), instance.validation.issue_count);
    }

    #[test]
    fn building_is_idempotent() {
        let instance = sample();
        assert_eq!(Report::build(&instance), Report::build(&instance));
    }

    #[test]
    fn tag_lookup_does_not_affect_outcome() {
        let mut instance = sample();
        let status = Report::build(&instance).overall_status;
        instance.profiles.clear();
        let report = Report::build(&instance);
        assert_eq!(report.component_tag, None);
        assert_eq!(report.overall_status, status);
    }

    #[test]
    fn csv_export() {
        let report = Report::build(&sample());
        let mut buffer = Vec::new();
        report.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "severity,code,count,requirement_ids,message_examples"
        );
        assert_eq!(lines.len(), 6);
        assert!(lines.contains(&"warning,REQ_SHALL_NOT_FOUND,2,V-001;V-002,no shall"));
    }

    #[test]
    fn csv_joins_multiple_examples_with_pipes() {
        let issues = vec![
            Issue::warning(IssueCode::AtomicityAndOr, "first").for_requirement("A"),
            Issue::warning(IssueCode::AtomicityAndOr, "second").for_requirement("B"),
        ];
        let report = Report::build(&instance_with(issues));
        let mut buffer = Vec::new();
        report.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("warning,REQ_ATOMICITY_ANDOR,2,A;B,first | second"));
    }

    #[test]
    fn json_export_round_trips() {
        let report = Report::build(&sample());
        let mut buffer = Vec::new();
        report.write_json(&mut buffer).unwrap();
        let parsed: Report = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed, report);
    }
}
