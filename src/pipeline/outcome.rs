//! Outcome classification - turning raw outcomes into pass/fail decisions

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::columns::{column_to_f64_vec, column_to_string_vec};
use crate::error::{AnalysisError, AnalysisResult};

/// How an outcome value is turned into a pass/fail decision.
///
/// Exactly one mode applies to an analysis; the two are mutually exclusive by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassRule {
    /// Numeric cutscore: a record passes iff `outcome >= cutscore`
    Threshold(f64),
    /// Passing categories: a record passes iff its outcome is one of these labels
    Labels(BTreeSet<String>),
}

impl PassRule {
    /// Numeric cutscore rule
    pub fn threshold(cutscore: f64) -> AnalysisResult<Self> {
        let rule = PassRule::Threshold(cutscore);
        rule.validate()?;
        Ok(rule)
    }

    /// Passing-label rule. A single label is a set of one.
    pub fn labels<I, S>(labels: I) -> AnalysisResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = PassRule::Labels(labels.into_iter().map(Into::into).collect());
        rule.validate()?;
        Ok(rule)
    }

    /// Build a rule from the two optional settings, exactly one of which must be given
    pub fn from_options(
        cutscore: Option<f64>,
        passing_labels: Option<Vec<String>>,
    ) -> AnalysisResult<Self> {
        match (cutscore, passing_labels) {
            (Some(cut), None) => PassRule::threshold(cut),
            (None, Some(labels)) => PassRule::labels(labels),
            (Some(_), Some(_)) => Err(AnalysisError::configuration(
                "Specify either a cutscore or passing labels, not both",
            )),
            (None, None) => Err(AnalysisError::configuration(
                "A cutscore or passing labels must be specified",
            )),
        }
    }

    /// Check the rule is usable (finite cutscore, non-empty label set)
    pub fn validate(&self) -> AnalysisResult<()> {
        match self {
            PassRule::Threshold(cut) if !cut.is_finite() => Err(AnalysisError::configuration(
                format!("Cutscore must be a finite number, got {}", cut),
            )),
            PassRule::Labels(labels) if labels.is_empty() => Err(AnalysisError::configuration(
                "Passing label set is empty",
            )),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for PassRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassRule::Threshold(cut) => write!(f, ">= {}", cut),
            PassRule::Labels(labels) => {
                let joined: Vec<&str> = labels.iter().map(String::as_str).collect();
                write!(f, "in {{{}}}", joined.join(", "))
            }
        }
    }
}

/// Numeric mode: pass iff the score is present and at least the cutscore
pub fn classify_scores(scores: &[Option<f64>], cutscore: f64) -> Vec<bool> {
    scores
        .iter()
        .map(|v| matches!(v, Some(x) if *x >= cutscore))
        .collect()
}

/// Categorical mode: pass iff the label is present and in the passing set
pub fn classify_labels(labels: &[Option<String>], passing: &BTreeSet<String>) -> Vec<bool> {
    labels
        .iter()
        .map(|v| v.as_ref().is_some_and(|s| passing.contains(s)))
        .collect()
}

/// Classify every record of an outcome column as pass (`true`) or fail.
///
/// Output has the same length and order as the column. Null outcomes fail.
pub fn classify(outcomes: &Column, rule: &PassRule) -> AnalysisResult<Vec<bool>> {
    rule.validate()?;

    let pass_fail = match rule {
        PassRule::Threshold(cutscore) => {
            if !outcomes.dtype().is_primitive_numeric() {
                return Err(AnalysisError::configuration(format!(
                    "A cutscore requires a numeric outcome column, but '{}' is {}. \
                     Use passing labels for categorical outcomes.",
                    outcomes.name(),
                    outcomes.dtype()
                )));
            }
            classify_scores(&column_to_f64_vec(outcomes)?, *cutscore)
        }
        PassRule::Labels(passing) => classify_labels(&column_to_string_vec(outcomes)?, passing),
    };

    let nulls = outcomes.null_count();
    if nulls > 0 {
        warn!(
            column = %outcomes.name(),
            nulls,
            "outcome column contains null values; they are classified as failing"
        );
    }

    let passed = pass_fail.iter().filter(|p| **p).count();
    debug!(rule = %rule, records = pass_fail.len(), passed, "classified outcomes");

    Ok(pass_fail)
}
