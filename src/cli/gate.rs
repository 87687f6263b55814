//! Quality-gate exit policy shared by the derive and validate commands.

use compreq::ValidationResult;

/// Exit codes are checked in order; the first that applies wins.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct Gate {
    /// Exit with status 2 if validation does not pass
    #[arg(long)]
    strict: bool,

    /// Exit with status 3 if any warnings are present
    #[arg(long)]
    fail_on_warnings: bool,

    /// Exit with status 4 if the warning count exceeds N
    #[arg(long, value_name = "N")]
    max_warnings: Option<usize>,
}

impl Gate {
    pub fn exit_code(&self, validation: &ValidationResult) -> Option<i32> {
        if self.strict && !validation.passed() {
            return Some(2);
        }
        if self.fail_on_warnings && validation.warning_count > 0 {
            return Some(3);
        }
        match self.max_warnings {
            Some(max) if validation.warning_count > max => Some(4),
            _ => None,
        }
    }

    /// Terminate the process if the gate is not met.
    pub fn enforce(&self, validation: &ValidationResult) {
        if let Some(code) = self.exit_code(validation) {
            tracing::debug!(code, "quality gate not met");
            std::process::exit(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use compreq::{Issue, IssueCode};
    use test_case::test_case;

    use super::*;

    fn result(errors: usize, warnings: usize) -> ValidationResult {
        let issues = std::iter::repeat_n(
            Issue::error(IssueCode::VerificationMethodMissing, "e"),
            errors,
        )
        .chain(std::iter::repeat_n(
            Issue::warning(IssueCode::ShallNotFound, "w"),
            warnings,
        ))
        .collect();
        ValidationResult::from_issues(issues)
    }

    const fn gate(strict: bool, fail_on_warnings: bool, max_warnings: Option<usize>) -> Gate {
        Gate {
            strict,
            fail_on_warnings,
            max_warnings,
        }
    }

    #[test_case(gate(false, false, None), 1, 5 => None; "no flags never fail")]
    #[test_case(gate(true, false, None), 1, 0 => Some(2); "strict fails on errors")]
    #[test_case(gate(true, false, None), 0, 3 => None; "strict ignores warnings")]
    #[test_case(gate(false, true, None), 0, 1 => Some(3); "any warning fails")]
    #[test_case(gate(false, true, None), 0, 0 => None; "no warnings passes")]
    #[test_case(gate(false, false, Some(2)), 0, 2 => None; "limit is inclusive")]
    #[test_case(gate(false, false, Some(2)), 0, 3 => Some(4); "over limit fails")]
    #[test_case(gate(true, true, Some(0)), 1, 1 => Some(2); "strict takes precedence")]
    #[test_case(gate(false, true, Some(0)), 0, 1 => Some(3); "warnings flag before limit")]
    fn exit_policy(gate: Gate, errors: usize, warnings: usize) -> Option<i32> {
        gate.exit_code(&result(errors, warnings))
    }
}
