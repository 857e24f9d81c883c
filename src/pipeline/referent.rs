//! Referent group selection
//!
//! The referent is the baseline group every other group is compared against.
//! Unless forced by the caller it is the highest-passing group among those
//! large enough to give a stable selection rate.

use tracing::{debug, warn};

use super::groups::{GroupRate, GroupStatistics};
use crate::error::{AnalysisError, AnalysisResult};

/// Default minimum sample size a group needs to be elected referent
pub const DEFAULT_MIN_REFERENT_N: usize = 5;

/// Determine the referent group.
///
/// * With `explicit`, that group is used as long as it was observed. It is
///   not held to the `min_n` floor since the caller chose it deliberately.
/// * Otherwise groups with `sample_size >= min_n` compete: highest selection
///   rate wins, then largest sample size, then the lexicographically smallest
///   label, so the choice never depends on input order.
pub fn select_referent(
    stats: &GroupStatistics,
    min_n: usize,
    explicit: Option<&str>,
) -> AnalysisResult<String> {
    if let Some(referent) = explicit {
        let group = stats.get(referent).map_err(|_| {
            AnalysisError::configuration(format!(
                "Referent '{}' is not among the observed groups: {:?}",
                referent,
                stats.group_names()
            ))
        })?;

        if group.sample_size < min_n {
            warn!(
                referent,
                sample_size = group.sample_size,
                min_n,
                "explicit referent is below the minimum referent sample size"
            );
        }
        return Ok(referent.to_string());
    }

    let best = stats
        .iter()
        .filter(|g| g.sample_size >= min_n)
        .max_by(|a, b| rank(a, b))
        .ok_or_else(|| {
            AnalysisError::insufficient_data(format!(
                "No group has at least {} records to serve as referent (largest group has {})",
                min_n,
                stats.iter().map(|g| g.sample_size).max().unwrap_or(0)
            ))
        })?;

    debug!(
        referent = %best.group,
        selection_rate = best.selection_rate,
        sample_size = best.sample_size,
        "selected referent"
    );

    Ok(best.group.clone())
}

/// Ordering under which the maximum is the preferred referent
fn rank(a: &GroupRate, b: &GroupRate) -> std::cmp::Ordering {
    a.selection_rate
        .total_cmp(&b.selection_rate)
        .then(a.sample_size.cmp(&b.sample_size))
        // Reversed so the smaller label ranks higher
        .then_with(|| b.group.cmp(&a.group))
}
