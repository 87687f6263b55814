//! Applicability conditions.
//!
//! A condition is either the literal `always`, a string-set equality
//! `key=value1|value2`, or a numeric comparison `key<op>number` where `<op>`
//! is one of `>=`, `<=`, `>`, `<`.
//!
//! Parsing is strict and returns a [`ConditionError`]. Evaluation never fails:
//! a condition that cannot be parsed or compared is simply a non-match, and
//! the reason is reported back to the caller.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::value::{Profile, lookup};

const ALWAYS: &str = "always";

/// A numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `<`
    Less,
}

impl Comparison {
    const fn symbol(self) -> &'static str {
        match self {
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::Less => "<",
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::GreaterOrEqual => lhs >= rhs,
            Self::LessOrEqual => lhs <= rhs,
            Self::Greater => lhs > rhs,
            Self::Less => lhs < rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operator tokens in the order they are tried.
///
/// Two-character operators come first because `>` and `<` are substrings of
/// them, and `=` is a substring of both.
#[derive(Debug, Clone, Copy)]
enum Operator {
    Compare(Comparison),
    Equals,
}

impl Operator {
    const PRECEDENCE: [Self; 5] = [
        Self::Compare(Comparison::GreaterOrEqual),
        Self::Compare(Comparison::LessOrEqual),
        Self::Compare(Comparison::Greater),
        Self::Compare(Comparison::Less),
        Self::Equals,
    ];

    const fn symbol(self) -> &'static str {
        match self {
            Self::Compare(op) => op.symbol(),
            Self::Equals => "=",
        }
    }

    /// Split `input` on the first operator found in precedence order.
    fn split(input: &str) -> Option<(&str, Self, &str)> {
        Self::PRECEDENCE.into_iter().find_map(|op| {
            input
                .split_once(op.symbol())
                .map(|(key, rhs)| (key, op, rhs))
        })
    }
}

/// A parsed applicability condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Matches unconditionally.
    Always,
    /// Matches when the profile value's string form is one of `accepted`.
    OneOf {
        /// The profile key to inspect.
        key: String,
        /// The accepted string values.
        accepted: Vec<String>,
    },
    /// Matches when the numeric profile value compares true against `rhs`.
    Compare {
        /// The profile key to inspect.
        key: String,
        /// The comparison operator.
        op: Comparison,
        /// The right-hand side, parsed as a number at evaluation time.
        rhs: String,
    },
}

/// Errors that can occur when parsing a [`Condition`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConditionError {
    /// The condition contains none of the recognised operators.
    #[error("Invalid condition (no operator found): '{0}'")]
    NoOperator(String),

    /// Nothing precedes the operator.
    #[error("Invalid condition (missing key): '{0}'")]
    MissingKey(String),

    /// Nothing follows the operator.
    #[error("Invalid condition (missing value): '{0}'")]
    MissingValue(String),
}

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input == ALWAYS {
            return Ok(Self::Always);
        }

        let (key, op, rhs) =
            Operator::split(input).ok_or_else(|| ConditionError::NoOperator(input.to_string()))?;

        let key = key.trim();
        let rhs = rhs.trim();
        if key.is_empty() {
            return Err(ConditionError::MissingKey(input.to_string()));
        }
        if rhs.is_empty() {
            return Err(ConditionError::MissingValue(input.to_string()));
        }

        Ok(match op {
            Operator::Equals => Self::OneOf {
                key: key.to_string(),
                accepted: rhs.split('|').map(|v| v.trim().to_string()).collect(),
            },
            Operator::Compare(op) => Self::Compare {
                key: key.to_string(),
                op,
                rhs: rhs.to_string(),
            },
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str(ALWAYS),
            Self::OneOf { key, accepted } => write!(f, "{key}={}", accepted.join("|")),
            Self::Compare { key, op, rhs } => write!(f, "{key}{op}{rhs}"),
        }
    }
}

/// The outcome of evaluating one condition or a whole rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether the condition(s) matched.
    pub matched: bool,
    /// Why evaluation failed. Empty when `matched` is true.
    pub reasons: Vec<String>,
}

impl Evaluation {
    const fn matched() -> Self {
        Self {
            matched: true,
            reasons: Vec::new(),
        }
    }

    fn failed(reason: String) -> Self {
        Self {
            matched: false,
            reasons: vec![reason],
        }
    }
}

impl Condition {
    /// Evaluate this condition against a profile.
    #[must_use]
    pub fn evaluate(&self, profile: &Profile) -> Evaluation {
        let key = match self {
            Self::Always => return Evaluation::matched(),
            Self::OneOf { key, .. } | Self::Compare { key, .. } => key,
        };

        let Some(value) = lookup(profile, key) else {
            return Evaluation::failed(format!("Missing profile value for '{key}'"));
        };

        match self {
            Self::Always => Evaluation::matched(),
            Self::OneOf { accepted, .. } => {
                let actual = value.to_string();
                if accepted.iter().any(|candidate| *candidate == actual) {
                    Evaluation::matched()
                } else {
                    Evaluation::failed(format!("{key}='{actual}' not in {accepted:?}"))
                }
            }
            Self::Compare { op, rhs, .. } => {
                let (Some(lhs), Ok(rhs_num)) = (value.as_f64(), rhs.parse::<f64>()) else {
                    return Evaluation::failed(format!(
                        "Non-numeric compare for {key} {op} {rhs} (value='{value}')"
                    ));
                };
                if op.apply(lhs, rhs_num) {
                    Evaluation::matched()
                } else {
                    Evaluation::failed(format!("{key}={lhs} not {op} {rhs_num}"))
                }
            }
        }
    }
}

/// Evaluate a raw condition string against a profile.
///
/// Malformed conditions are reported as a non-match carrying the parse error.
#[must_use]
pub fn evaluate(profile: &Profile, condition: &str) -> Evaluation {
    match condition.parse::<Condition>() {
        Ok(condition) => condition.evaluate(profile),
        Err(e) => {
            warn!(condition, "malformed applicability condition: {e}");
            Evaluation::failed(e.to_string())
        }
    }
}

fn default_when() -> Vec<String> {
    vec![ALWAYS.to_string()]
}

/// An applicability rule: a list of conditions that must all hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicability {
    /// The conditions, combined with AND semantics.
    #[serde(default = "default_when")]
    pub when: Vec<String>,
}

impl Default for Applicability {
    fn default() -> Self {
        Self {
            when: default_when(),
        }
    }
}

impl Applicability {
    /// Evaluate every condition against the profile.
    ///
    /// Conditions are not short-circuited: the reasons of every failing
    /// condition are collected. An empty rule matches.
    #[must_use]
    pub fn evaluate(&self, profile: &Profile) -> Evaluation {
        let reasons: Vec<String> = self
            .when
            .iter()
            .flat_map(|condition| {
                let evaluation = evaluate(profile, condition);
                if evaluation.matched {
                    Vec::new()
                } else if evaluation.reasons.is_empty() {
                    vec![format!("Failed condition: {condition}")]
                } else {
                    evaluation.reasons
                }
            })
            .collect();

        Evaluation {
            matched: reasons.is_empty(),
            reasons,
        }
    }
}
