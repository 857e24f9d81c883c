//! Adverse impact analysis - runs every stage against one table

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use super::columns::{column_to_string_vec, require_column};
use super::filters::apply_filters;
use super::groups::aggregate_selection_rates;
use super::impact::evaluate_impact;
use super::outcome::classify;
use super::referent::select_referent;
use crate::config::AdverseImpactConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::report::AdverseImpactReport;

/// Run a complete adverse impact analysis.
///
/// Stages run in order: validate the configuration, filter records, classify
/// outcomes, aggregate by group, select the referent and evaluate impact.
/// The first failing stage aborts the analysis; no partial report is returned.
/// The input frame is never modified.
pub fn run_adverse_impact(
    df: &DataFrame,
    config: &AdverseImpactConfig,
) -> AnalysisResult<AdverseImpactReport> {
    config.validate()?;
    require_column(df, &config.group_column)?;
    require_column(df, &config.outcome_column)?;

    let filtered = apply_filters(df, &config.filters)?;
    if filtered.height() == 0 {
        return Err(AnalysisError::insufficient_data(format!(
            "No records remain after applying {} filter(s) to {} records",
            config.filters.len(),
            df.height()
        )));
    }

    let pass_fail = classify(
        require_column(&filtered, &config.outcome_column)?,
        &config.rule,
    )?;
    let groups = column_to_string_vec(require_column(&filtered, &config.group_column)?)?;

    let stats = aggregate_selection_rates(&pass_fail, &groups)?;
    if stats.is_empty() {
        return Err(AnalysisError::insufficient_data(format!(
            "Column '{}' has no non-null group labels",
            config.group_column
        )));
    }

    let referent = select_referent(&stats, config.min_referent_n, config.referent.as_deref())?;
    let impacts = evaluate_impact(&stats, &pass_fail, &groups, &referent)?;

    info!(
        group_column = %config.group_column,
        referent = %referent,
        groups = stats.len(),
        records = filtered.height(),
        "adverse impact analysis complete"
    );

    Ok(AdverseImpactReport::new(
        config.clone(),
        df.height(),
        filtered.height(),
        pass_fail,
        stats,
        impacts,
    ))
}

/// Run the same analysis across several grouping columns in parallel.
///
/// Each column gets its own copy of `template` with the grouping column
/// replaced. Results come back in the order of `group_columns`, and a
/// failure for one column does not affect the others.
pub fn run_adverse_impact_batch(
    df: &DataFrame,
    group_columns: &[&str],
    template: &AdverseImpactConfig,
) -> Vec<(String, AnalysisResult<AdverseImpactReport>)> {
    debug!(columns = group_columns.len(), "running batch adverse impact analysis");

    group_columns
        .par_iter()
        .map(|column| {
            let config = template.for_group_column(*column);
            (column.to_string(), run_adverse_impact(df, &config))
        })
        .collect()
}
