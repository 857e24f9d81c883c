//! Group aggregation - selection rate and sample size per group

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};

/// Selection outcome counts for a single group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRate {
    /// Group label (e.g. a demographic category)
    pub group: String,
    /// Number of records in the group that passed
    pub passed: usize,
    /// Number of records in the group
    pub sample_size: usize,
    /// Fraction of the group that passed (passed / sample_size)
    pub selection_rate: f64,
}

impl GroupRate {
    /// Create a group rate from counts. A group must have at least one record.
    pub fn new(group: impl Into<String>, passed: usize, sample_size: usize) -> AnalysisResult<Self> {
        let group = group.into();
        if sample_size == 0 {
            return Err(AnalysisError::insufficient_data(format!(
                "group '{}' has no observations; its selection rate is undefined",
                group
            )));
        }
        if passed > sample_size {
            return Err(AnalysisError::configuration(format!(
                "group '{}' cannot have {} passing out of {} records",
                group, passed, sample_size
            )));
        }
        Ok(Self {
            group,
            passed,
            sample_size,
            selection_rate: passed as f64 / sample_size as f64,
        })
    }

    /// Number of records in the group that failed
    pub fn failed(&self) -> usize {
        self.sample_size - self.passed
    }
}

/// Per-group selection statistics, keyed and ordered by group label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GroupStatistics {
    groups: BTreeMap<String, GroupRate>,
}

impl GroupStatistics {
    /// Statistics for one group; absent groups have no observations
    pub fn get(&self, group: &str) -> AnalysisResult<&GroupRate> {
        self.groups.get(group).ok_or_else(|| {
            AnalysisError::insufficient_data(format!(
                "group '{}' has no observations in the analyzed records",
                group
            ))
        })
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Iterate groups in canonical (lexicographic) order
    pub fn iter(&self) -> impl Iterator<Item = &GroupRate> {
        self.groups.values()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of records across all groups
    pub fn total_sample_size(&self) -> usize {
        self.groups.values().map(|g| g.sample_size).sum()
    }

    /// Render as a table with columns `group`, `selection_rate`, `sample_size`
    pub fn to_dataframe(&self) -> AnalysisResult<DataFrame> {
        let names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        let rates: Vec<f64> = self.groups.values().map(|g| g.selection_rate).collect();
        let sizes: Vec<u64> = self.groups.values().map(|g| g.sample_size as u64).collect();

        let df = DataFrame::new(vec![
            Column::new("group".into(), names),
            Column::new("selection_rate".into(), rates),
            Column::new("sample_size".into(), sizes),
        ])?;
        Ok(df)
    }
}

impl FromIterator<GroupRate> for GroupStatistics {
    fn from_iter<T: IntoIterator<Item = GroupRate>>(iter: T) -> Self {
        Self {
            groups: iter.into_iter().map(|g| (g.group.clone(), g)).collect(),
        }
    }
}

/// Compute selection rate and sample size for every group.
///
/// `pass_fail` and `groups` must be aligned record by record. Records with a
/// null group are excluded (they belong to no group).
pub fn aggregate_selection_rates(
    pass_fail: &[bool],
    groups: &[Option<String>],
) -> AnalysisResult<GroupStatistics> {
    if pass_fail.len() != groups.len() {
        return Err(AnalysisError::configuration(format!(
            "pass/fail vector has {} records but the group vector has {}",
            pass_fail.len(),
            groups.len()
        )));
    }

    // (passed, count) per group
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    let mut ungrouped = 0usize;

    for (passed, group) in pass_fail.iter().zip(groups.iter()) {
        match group {
            Some(g) => {
                let entry = counts.entry(g.as_str()).or_insert((0, 0));
                if *passed {
                    entry.0 += 1;
                }
                entry.1 += 1;
            }
            None => ungrouped += 1,
        }
    }

    if ungrouped > 0 {
        warn!(
            records = ungrouped,
            "records with a null group were excluded from selection rates"
        );
    }

    let stats = counts
        .into_iter()
        .map(|(group, (passed, n))| GroupRate::new(group, passed, n))
        .collect::<AnalysisResult<GroupStatistics>>()?;

    debug!(groups = stats.len(), records = stats.total_sample_size(), "aggregated selection rates");

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_basic_rates() {
        let pass_fail = vec![false, false, true, true];
        let groups = labels(&["A", "A", "B", "B"]);
        let stats = aggregate_selection_rates(&pass_fail, &groups).unwrap();

        let a = stats.get("A").unwrap();
        assert_eq!(a.selection_rate, 0.0);
        assert_eq!(a.sample_size, 2);

        let b = stats.get("B").unwrap();
        assert_eq!(b.selection_rate, 1.0);
        assert_eq!(b.sample_size, 2);
    }

    #[test]
    fn test_sample_sizes_sum_to_records() {
        let pass_fail = vec![true, false, true, true, false, false, true];
        let groups = labels(&["x", "y", "z", "x", "y", "x", "z"]);
        let stats = aggregate_selection_rates(&pass_fail, &groups).unwrap();
        assert_eq!(stats.total_sample_size(), pass_fail.len());
        assert_eq!(stats.len(), 3);
        assert!(stats.iter().all(|g| (0.0..=1.0).contains(&g.selection_rate)));
    }

    #[test]
    fn test_order_independent() {
        let pass_fail = vec![true, false, true, false];
        let groups = labels(&["A", "B", "B", "A"]);
        let forward = aggregate_selection_rates(&pass_fail, &groups).unwrap();

        let mut rev_pass = pass_fail.clone();
        let mut rev_groups = groups.clone();
        rev_pass.reverse();
        rev_groups.reverse();
        let backward = aggregate_selection_rates(&rev_pass, &rev_groups).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_null_groups_excluded() {
        let pass_fail = vec![true, true, false];
        let groups = vec![Some("A".to_string()), None, Some("A".to_string())];
        let stats = aggregate_selection_rates(&pass_fail, &groups).unwrap();
        assert_eq!(stats.total_sample_size(), 2);
        assert_eq!(stats.get("A").unwrap().passed, 1);
    }

    #[test]
    fn test_misaligned_inputs() {
        let err = aggregate_selection_rates(&[true], &labels(&["A", "B"])).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_group_lookup() {
        let stats = aggregate_selection_rates(&[true], &labels(&["A"])).unwrap();
        assert!(matches!(stats.get("Z"), Err(AnalysisError::InsufficientData(_))));
    }

    #[test]
    fn test_group_rate_validation() {
        assert!(matches!(GroupRate::new("A", 0, 0), Err(AnalysisError::InsufficientData(_))));
        assert!(GroupRate::new("A", 3, 2).unwrap_err().is_configuration());
        assert_eq!(GroupRate::new("A", 1, 4).unwrap().failed(), 3);
    }

    #[test]
    fn test_to_dataframe() {
        let stats: GroupStatistics = vec![
            GroupRate::new("B", 1, 2).unwrap(),
            GroupRate::new("A", 3, 4).unwrap(),
        ]
        .into_iter()
        .collect();

        let df = stats.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 3));
        let groups = df.column("group").unwrap().str().unwrap();
        assert_eq!(groups.get(0), Some("A"));
        let rates = df.column("selection_rate").unwrap().f64().unwrap();
        assert_eq!(rates.get(0), Some(0.75));
    }
}
