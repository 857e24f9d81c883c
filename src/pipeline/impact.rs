//! Impact evaluation - impact ratios and exact tests against the referent

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::groups::GroupStatistics;
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats::fisher_exact_two_sided;

/// Impact ratio below which the four-fifths rule flags adverse impact
pub const FOUR_FIFTHS_THRESHOLD: f64 = 0.8;

/// Conventional significance level for the exact test
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// 2x2 table of pass/fail counts for a focal group against the referent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContingencyTable {
    pub focal_pass: u64,
    pub focal_fail: u64,
    pub referent_pass: u64,
    pub referent_fail: u64,
}

impl ContingencyTable {
    /// `[[focal_pass, focal_fail], [referent_pass, referent_fail]]`
    pub fn as_array(&self) -> [[u64; 2]; 2] {
        [
            [self.focal_pass, self.focal_fail],
            [self.referent_pass, self.referent_fail],
        ]
    }

    pub fn total(&self) -> u64 {
        self.focal_pass + self.focal_fail + self.referent_pass + self.referent_fail
    }

    /// Same table with the pass and fail columns exchanged
    pub fn swap_outcomes(&self) -> Self {
        Self {
            focal_pass: self.focal_fail,
            focal_fail: self.focal_pass,
            referent_pass: self.referent_fail,
            referent_fail: self.referent_pass,
        }
    }

    /// Two-sided Fisher exact p-value for this table
    pub fn p_value(&self) -> f64 {
        fisher_exact_two_sided(self.as_array())
    }
}

/// Comparison of one group with the referent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupImpact {
    pub group: String,
    /// Selection rate of the group divided by the referent's
    pub impact_ratio: f64,
    /// Two-sided Fisher exact p-value of the group-vs-referent table
    pub p_value: f64,
    pub table: ContingencyTable,
}

impl GroupImpact {
    /// Impact ratio falls below four-fifths
    pub fn violates_four_fifths(&self) -> bool {
        self.impact_ratio < FOUR_FIFTHS_THRESHOLD
    }

    /// Difference from the referent is significant at `alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Impact results for every non-referent group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImpactResults {
    pub referent: String,
    pub impacts: Vec<GroupImpact>,
}

impl ImpactResults {
    /// Result for one group, if it was compared
    pub fn get(&self, group: &str) -> Option<&GroupImpact> {
        self.impacts.iter().find(|i| i.group == group)
    }

    pub fn len(&self) -> usize {
        self.impacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impacts.is_empty()
    }
}

/// Ratio of a group's selection rate to the referent's
pub fn impact_ratio(group_rate: f64, referent_rate: f64) -> AnalysisResult<f64> {
    if referent_rate == 0.0 {
        return Err(AnalysisError::undefined(
            "referent selection rate is zero; impact ratios would divide by zero",
        ));
    }
    Ok(group_rate / referent_rate)
}

/// Pass/fail counts per group from the raw records (nulls skipped)
fn cross_tabulate<'a>(
    pass_fail: &[bool],
    groups: &'a [Option<String>],
) -> BTreeMap<&'a str, (u64, u64)> {
    let mut tab: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for (passed, group) in pass_fail.iter().zip(groups.iter()) {
        if let Some(g) = group {
            let entry = tab.entry(g.as_str()).or_insert((0, 0));
            if *passed {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }
    tab
}

/// Build the 2x2 table for one focal group against the referent
pub fn contingency_table(
    pass_fail: &[bool],
    groups: &[Option<String>],
    focal: &str,
    referent: &str,
) -> AnalysisResult<ContingencyTable> {
    if pass_fail.len() != groups.len() {
        return Err(AnalysisError::configuration(format!(
            "pass/fail vector has {} records but the group vector has {}",
            pass_fail.len(),
            groups.len()
        )));
    }

    let tab = cross_tabulate(pass_fail, groups);
    table_from_crosstab(&tab, focal, referent)
}

fn table_from_crosstab(
    tab: &BTreeMap<&str, (u64, u64)>,
    focal: &str,
    referent: &str,
) -> AnalysisResult<ContingencyTable> {
    let lookup = |group: &str| {
        tab.get(group).copied().ok_or_else(|| {
            AnalysisError::insufficient_data(format!(
                "group '{}' has no observations in the analyzed records",
                group
            ))
        })
    };

    let (focal_pass, focal_fail) = lookup(focal)?;
    let (referent_pass, referent_fail) = lookup(referent)?;

    Ok(ContingencyTable {
        focal_pass,
        focal_fail,
        referent_pass,
        referent_fail,
    })
}

/// Compare every non-referent group with the referent.
///
/// Impact ratios come from the group statistics; p-values come from 2x2
/// tables of counts built from the raw records. The two sources must agree
/// on every group's size.
pub fn evaluate_impact(
    stats: &GroupStatistics,
    pass_fail: &[bool],
    groups: &[Option<String>],
    referent: &str,
) -> AnalysisResult<ImpactResults> {
    if pass_fail.len() != groups.len() {
        return Err(AnalysisError::configuration(format!(
            "pass/fail vector has {} records but the group vector has {}",
            pass_fail.len(),
            groups.len()
        )));
    }

    let referent_rate = stats.get(referent)?.selection_rate;
    let tab = cross_tabulate(pass_fail, groups);

    let mut impacts = Vec::with_capacity(stats.len().saturating_sub(1));
    for group in stats.iter().filter(|g| g.group != referent) {
        let ratio = impact_ratio(group.selection_rate, referent_rate)?;
        let table = table_from_crosstab(&tab, &group.group, referent)?;

        if (table.focal_pass + table.focal_fail) as usize != group.sample_size {
            return Err(AnalysisError::configuration(format!(
                "group statistics report {} records for '{}' but the records contain {}",
                group.sample_size,
                group.group,
                table.focal_pass + table.focal_fail
            )));
        }

        let p_value = table.p_value();
        debug!(group = %group.group, impact_ratio = ratio, p_value, "evaluated impact");

        impacts.push(GroupImpact {
            group: group.group.clone(),
            impact_ratio: ratio,
            p_value,
            table,
        });
    }

    Ok(ImpactResults {
        referent: referent.to_string(),
        impacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::groups::aggregate_selection_rates;

    fn records(counts: &[(&str, usize, usize)]) -> (Vec<bool>, Vec<Option<String>>) {
        let mut pass_fail = Vec::new();
        let mut groups = Vec::new();
        for (group, passed, failed) in counts {
            for _ in 0..*passed {
                pass_fail.push(true);
                groups.push(Some(group.to_string()));
            }
            for _ in 0..*failed {
                pass_fail.push(false);
                groups.push(Some(group.to_string()));
            }
        }
        (pass_fail, groups)
    }

    #[test]
    fn test_two_group_ratio_and_p_value() {
        let (pass_fail, groups) = records(&[("A", 8, 2), ("B", 2, 8)]);
        let stats = aggregate_selection_rates(&pass_fail, &groups).unwrap();
        let results = evaluate_impact(&stats, &pass_fail, &groups, "A").unwrap();

        assert_eq!(results.len(), 1);
        let b = results.get("B").unwrap();
        assert!((b.impact_ratio - 0.25).abs() < 1e-12);
        assert!((b.p_value - 0.023014137565221155).abs() < 1e-9);
        assert_eq!(b.table.as_array(), [[2, 8], [8, 2]]);
        assert!(b.violates_four_fifths());
        assert!(b.is_significant(SIGNIFICANCE_LEVEL));
    }

    #[test]
    fn test_referent_excluded_from_results() {
        let (pass_fail, groups) = records(&[("A", 5, 5), ("B", 4, 6), ("C", 3, 7)]);
        let stats = aggregate_selection_rates(&pass_fail, &groups).unwrap();
        let results = evaluate_impact(&stats, &pass_fail, &groups, "A").unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.get("A").is_none());
    }

    #[test]
    fn test_zero_referent_rate_is_undefined() {
        let (pass_fail, groups) = records(&[("A", 0, 10), ("B", 0, 10)]);
        let stats = aggregate_selection_rates(&pass_fail, &groups).unwrap();
        let err = evaluate_impact(&stats, &pass_fail, &groups, "A").unwrap_err();
        assert!(matches!(err, AnalysisError::UndefinedStatistic(_)));
    }

    #[test]
    fn test_impact_ratio_helper() {
        assert_eq!(impact_ratio(0.4, 0.8).unwrap(), 0.5);
        assert!(matches!(impact_ratio(0.4, 0.0), Err(AnalysisError::UndefinedStatistic(_))));
    }

    #[test]
    fn test_p_value_symmetric_under_outcome_swap() {
        let table = ContingencyTable {
            focal_pass: 3,
            focal_fail: 9,
            referent_pass: 11,
            referent_fail: 4,
        };
        assert!((table.p_value() - table.swap_outcomes().p_value()).abs() < 1e-12);
    }

    #[test]
    fn test_contingency_table_counts() {
        let (pass_fail, groups) = records(&[("A", 3, 1), ("B", 1, 2)]);
        let table = contingency_table(&pass_fail, &groups, "B", "A").unwrap();
        assert_eq!(table.as_array(), [[1, 2], [3, 1]]);
        assert_eq!(table.total(), 7);
    }

    #[test]
    fn test_contingency_table_unknown_group() {
        let (pass_fail, groups) = records(&[("A", 3, 1)]);
        let err = contingency_table(&pass_fail, &groups, "Z", "A").unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_mismatched_statistics_detected() {
        let (pass_fail, groups) = records(&[("A", 5, 5), ("B", 2, 3)]);
        let stats: GroupStatistics = vec![
            crate::pipeline::GroupRate::new("A", 5, 10).unwrap(),
            crate::pipeline::GroupRate::new("B", 2, 6).unwrap(),
        ]
        .into_iter()
        .collect();
        let err = evaluate_impact(&stats, &pass_fail, &groups, "A").unwrap_err();
        assert!(err.is_configuration());
    }
}
