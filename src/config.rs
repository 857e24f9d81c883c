//! Adverse impact analysis configuration
//!
//! A configuration names the grouping and outcome columns, the pass rule,
//! how the referent is chosen and which records to filter out first. It can
//! be built in code or read from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::pipeline::{PassRule, RecordFilter, DEFAULT_MIN_REFERENT_N};

fn default_min_referent_n() -> usize {
    DEFAULT_MIN_REFERENT_N
}

/// Settings for one adverse impact analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdverseImpactConfig {
    /// Column holding the group (typically a protected class such as gender)
    pub group_column: String,
    /// Column holding the score or decision hiring is based on
    pub outcome_column: String,
    /// Cutscore or passing labels
    pub rule: PassRule,
    /// Force this group to be the referent instead of electing one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referent: Option<String>,
    /// Smallest group size still eligible for election as referent
    #[serde(default = "default_min_referent_n")]
    pub min_referent_n: usize,
    /// Filters applied (in order) before the analysis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<RecordFilter>,
}

impl AdverseImpactConfig {
    pub fn new(
        group_column: impl Into<String>,
        outcome_column: impl Into<String>,
        rule: PassRule,
    ) -> Self {
        Self {
            group_column: group_column.into(),
            outcome_column: outcome_column.into(),
            rule,
            referent: None,
            min_referent_n: DEFAULT_MIN_REFERENT_N,
            filters: Vec::new(),
        }
    }

    /// Use `referent` as the comparison group
    pub fn with_referent(mut self, referent: impl Into<String>) -> Self {
        self.referent = Some(referent.into());
        self
    }

    pub fn with_min_referent_n(mut self, min_referent_n: usize) -> Self {
        self.min_referent_n = min_referent_n;
        self
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Same settings, analyzed across a different grouping column
    pub fn for_group_column(&self, group_column: impl Into<String>) -> Self {
        Self {
            group_column: group_column.into(),
            ..self.clone()
        }
    }

    /// Parse a configuration from JSON and validate it
    pub fn from_json_str(json: &str) -> AnalysisResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> AnalysisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check settings that do not depend on the data
    pub fn validate(&self) -> AnalysisResult<()> {
        validate_column_name("group_column", &self.group_column)?;
        validate_column_name("outcome_column", &self.outcome_column)?;

        if self.group_column == self.outcome_column {
            return Err(AnalysisError::configuration(format!(
                "group_column and outcome_column must differ, both are '{}'",
                self.group_column
            )));
        }

        self.rule.validate()?;

        if let Some(referent) = &self.referent {
            if referent.trim().is_empty() {
                return Err(AnalysisError::configuration("referent must not be blank"));
            }
        }

        for filter in &self.filters {
            filter.validate()?;
        }

        Ok(())
    }
}

/// Validator for column name settings
fn validate_column_name(setting: &str, value: &str) -> AnalysisResult<()> {
    if value.trim().is_empty() {
        Err(AnalysisError::configuration(format!(
            "{} must name a column, got an empty string",
            setting
        )))
    } else {
        Ok(())
    }
}
