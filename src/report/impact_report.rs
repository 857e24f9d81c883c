//! Adverse impact report - per-group results of one analysis

use polars::prelude::*;
use serde::Serialize;

use crate::config::AdverseImpactConfig;
use crate::error::AnalysisResult;
use crate::pipeline::{
    run_adverse_impact, GroupStatistics, ImpactResults, FOUR_FIFTHS_THRESHOLD, SIGNIFICANCE_LEVEL,
};

/// One group's line in the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub group: String,
    pub selection_rate: f64,
    pub sample_size: usize,
    /// 1.0 for the referent
    pub impact_ratio: f64,
    /// Absent for the referent, which is not tested against itself
    pub p_value: Option<f64>,
    pub is_referent: bool,
    /// Impact ratio below four-fifths
    pub four_fifths_violation: bool,
    /// Exact test significant at the conventional level
    pub significant: bool,
}

/// Result of a complete adverse impact analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdverseImpactReport {
    /// Settings the analysis ran with
    pub config: AdverseImpactConfig,
    /// Records in the input table
    pub records_input: usize,
    /// Records left after filtering
    pub records_analyzed: usize,
    /// Pass/fail classification of each analyzed record, in row order
    #[serde(skip)]
    pub pass_fail: Vec<bool>,
    /// Selection rate and sample size per group
    pub statistics: GroupStatistics,
    /// Comparisons of each group against the referent
    pub impacts: ImpactResults,
}

impl AdverseImpactReport {
    pub fn new(
        config: AdverseImpactConfig,
        records_input: usize,
        records_analyzed: usize,
        pass_fail: Vec<bool>,
        statistics: GroupStatistics,
        impacts: ImpactResults,
    ) -> Self {
        Self {
            config,
            records_input,
            records_analyzed,
            pass_fail,
            statistics,
            impacts,
        }
    }

    /// Run the analysis described by `config` on `df`
    pub fn build(df: &DataFrame, config: &AdverseImpactConfig) -> AnalysisResult<Self> {
        run_adverse_impact(df, config)
    }

    /// The referent group's label
    pub fn referent(&self) -> &str {
        &self.impacts.referent
    }

    /// Records removed by the configured filters
    pub fn records_filtered(&self) -> usize {
        self.records_input - self.records_analyzed
    }

    /// Report rows in canonical group order
    pub fn rows(&self) -> Vec<ReportRow> {
        self.statistics
            .iter()
            .map(|rate| {
                let impact = self.impacts.get(&rate.group);
                ReportRow {
                    group: rate.group.clone(),
                    selection_rate: rate.selection_rate,
                    sample_size: rate.sample_size,
                    impact_ratio: impact.map_or(1.0, |i| i.impact_ratio),
                    p_value: impact.map(|i| i.p_value),
                    is_referent: impact.is_none(),
                    four_fifths_violation: impact.is_some_and(|i| i.violates_four_fifths()),
                    significant: impact.is_some_and(|i| i.is_significant(SIGNIFICANCE_LEVEL)),
                }
            })
            .collect()
    }

    /// Groups whose impact ratio falls below four-fifths
    pub fn four_fifths_violations(&self) -> Vec<&str> {
        self.impacts
            .impacts
            .iter()
            .filter(|i| i.impact_ratio < FOUR_FIFTHS_THRESHOLD)
            .map(|i| i.group.as_str())
            .collect()
    }

    /// Groups that differ significantly from the referent
    pub fn significant_differences(&self) -> Vec<&str> {
        self.impacts
            .impacts
            .iter()
            .filter(|i| i.is_significant(SIGNIFICANCE_LEVEL))
            .map(|i| i.group.as_str())
            .collect()
    }

    /// Summary table with one row per group.
    ///
    /// Columns: `group`, `selection_rate`, `sample_size`, `impact_ratio`,
    /// `p_value`. The referent has an impact ratio of 1.0 and a null p-value.
    pub fn summary(&self) -> AnalysisResult<DataFrame> {
        let rows = self.rows();

        let groups: Vec<&str> = rows.iter().map(|r| r.group.as_str()).collect();
        let rates: Vec<f64> = rows.iter().map(|r| r.selection_rate).collect();
        let sizes: Vec<u64> = rows.iter().map(|r| r.sample_size as u64).collect();
        let ratios: Vec<f64> = rows.iter().map(|r| r.impact_ratio).collect();
        let p_values: Vec<Option<f64>> = rows.iter().map(|r| r.p_value).collect();

        let df = DataFrame::new(vec![
            Column::new("group".into(), groups),
            Column::new("selection_rate".into(), rates),
            Column::new("sample_size".into(), sizes),
            Column::new("impact_ratio".into(), ratios),
            Column::new("p_value".into(), p_values),
        ])?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{evaluate_impact, GroupRate, PassRule};

    fn report() -> AdverseImpactReport {
        let mut pass_fail = Vec::new();
        let mut groups = Vec::new();
        for (group, passed, failed) in [("A", 8, 2), ("B", 2, 8), ("C", 7, 3)] {
            pass_fail.extend(std::iter::repeat(true).take(passed));
            pass_fail.extend(std::iter::repeat(false).take(failed));
            groups.extend(std::iter::repeat(Some(group.to_string())).take(passed + failed));
        }
        let statistics: GroupStatistics = vec![
            GroupRate::new("A", 8, 10).unwrap(),
            GroupRate::new("B", 2, 10).unwrap(),
            GroupRate::new("C", 7, 10).unwrap(),
        ]
        .into_iter()
        .collect();
        let impacts = evaluate_impact(&statistics, &pass_fail, &groups, "A").unwrap();
        let config = AdverseImpactConfig::new("group", "score", PassRule::Threshold(1.0));
        AdverseImpactReport::new(config, 32, 30, pass_fail, statistics, impacts)
    }

    #[test]
    fn test_rows_mark_referent() {
        let rows = report().rows();
        assert_eq!(rows.len(), 3);

        let a = &rows[0];
        assert!(a.is_referent);
        assert_eq!(a.impact_ratio, 1.0);
        assert!(a.p_value.is_none());
        assert!(!a.four_fifths_violation);

        let b = &rows[1];
        assert!(!b.is_referent);
        assert!(b.four_fifths_violation);
        assert!(b.significant);

        let c = &rows[2];
        assert!((c.impact_ratio - 0.875).abs() < 1e-12);
        assert!(!c.four_fifths_violation);
    }

    #[test]
    fn test_summary_frame() {
        let summary = report().summary().unwrap();
        assert_eq!(summary.shape(), (3, 5));
        let p = summary.column("p_value").unwrap();
        assert_eq!(p.null_count(), 1);
        let ratios = summary.column("impact_ratio").unwrap().f64().unwrap();
        assert_eq!(ratios.get(0), Some(1.0));
    }

    #[test]
    fn test_flag_lists() {
        let report = report();
        assert_eq!(report.four_fifths_violations(), vec!["B"]);
        assert_eq!(report.significant_differences(), vec!["B"]);
        assert_eq!(report.records_filtered(), 2);
        assert_eq!(report.referent(), "A");
    }
}
