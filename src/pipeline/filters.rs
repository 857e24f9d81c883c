//! Record filters applied before an analysis
//!
//! Each filter takes a frame and returns a new, smaller frame. Filters are
//! applied in order and never modify their input.

use std::collections::HashMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::columns::{column_to_string_vec, non_null_values, require_column};
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats::ScoreMethod;

/// A rule removing records from the analyzed table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordFilter {
    /// Keep records whose group in `column` has more than `min_count` records
    MinGroupCount { column: String, min_count: usize },
    /// Keep records whose group in `column` makes up more than
    /// `min_proportion` of the (non-null) records
    MinGroupProportion { column: String, min_proportion: f64 },
    /// Keep records whose score on `column` satisfies `|score| <= max_abs_score`
    Outliers {
        column: String,
        method: ScoreMethod,
        max_abs_score: f64,
    },
}

impl RecordFilter {
    /// Column the filter reads
    pub fn column(&self) -> &str {
        match self {
            RecordFilter::MinGroupCount { column, .. }
            | RecordFilter::MinGroupProportion { column, .. }
            | RecordFilter::Outliers { column, .. } => column,
        }
    }

    /// Check the filter's parameters (column existence is checked on apply)
    pub fn validate(&self) -> AnalysisResult<()> {
        match self {
            RecordFilter::MinGroupCount { .. } => Ok(()),
            RecordFilter::MinGroupProportion { min_proportion, .. } => {
                if !(0.0..1.0).contains(min_proportion) {
                    return Err(AnalysisError::configuration(format!(
                        "min_proportion must be in [0.0, 1.0), got {}",
                        min_proportion
                    )));
                }
                Ok(())
            }
            RecordFilter::Outliers {
                method,
                max_abs_score,
                ..
            } => {
                if !(max_abs_score.is_finite() && *max_abs_score > 0.0) {
                    return Err(AnalysisError::configuration(format!(
                        "max_abs_score must be a positive number, got {}",
                        max_abs_score
                    )));
                }
                if let ScoreMethod::Iqr { tail } = method {
                    if !(*tail > 0.0 && *tail < 0.5) {
                        return Err(AnalysisError::configuration(format!(
                            "IQR tail must be in (0.0, 0.5), got {}",
                            tail
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Row mask of records to keep
    fn keep_mask(&self, df: &DataFrame) -> AnalysisResult<Vec<bool>> {
        let col = require_column(df, self.column())?;

        match self {
            RecordFilter::MinGroupCount { min_count, .. } => {
                let labels = column_to_string_vec(col)?;
                let counts = value_counts(&labels);
                Ok(labels
                    .iter()
                    .map(|v| v.as_ref().is_some_and(|s| counts[s.as_str()] > *min_count))
                    .collect())
            }
            RecordFilter::MinGroupProportion { min_proportion, .. } => {
                let labels = column_to_string_vec(col)?;
                let counts = value_counts(&labels);
                let total: usize = counts.values().sum();
                Ok(labels
                    .iter()
                    .map(|v| {
                        v.as_ref().is_some_and(|s| {
                            counts[s.as_str()] as f64 / total as f64 > *min_proportion
                        })
                    })
                    .collect())
            }
            RecordFilter::Outliers {
                method,
                max_abs_score,
                ..
            } => {
                let (rows, values) = non_null_values(col)?;
                let scores = method.score(&values)?;
                let mut mask = vec![false; df.height()];
                for (row, score) in rows.into_iter().zip(scores) {
                    mask[row] = score.abs() <= *max_abs_score;
                }
                Ok(mask)
            }
        }
    }
}

impl std::fmt::Display for RecordFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordFilter::MinGroupCount { column, min_count } => {
                write!(f, "{}: group count > {}", column, min_count)
            }
            RecordFilter::MinGroupProportion {
                column,
                min_proportion,
            } => write!(f, "{}: group share > {}", column, min_proportion),
            RecordFilter::Outliers {
                column,
                method,
                max_abs_score,
            } => write!(f, "{}: |{} score| <= {}", column, method, max_abs_score),
        }
    }
}

fn value_counts(labels: &[Option<String>]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels.iter().flatten() {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Apply a single filter, returning a new frame
pub fn apply_filter(df: &DataFrame, filter: &RecordFilter) -> AnalysisResult<DataFrame> {
    filter.validate()?;
    let mask = filter.keep_mask(df)?;
    let mask = BooleanChunked::from_slice("keep".into(), &mask);
    let filtered = df.filter(&mask)?;

    info!(
        filter = %filter,
        before = df.height(),
        after = filtered.height(),
        "applied record filter"
    );

    Ok(filtered)
}

/// Apply filters in order, threading each result into the next
pub fn apply_filters(df: &DataFrame, filters: &[RecordFilter]) -> AnalysisResult<DataFrame> {
    filters
        .iter()
        .try_fold(df.clone(), |current, filter| apply_filter(&current, filter))
}
