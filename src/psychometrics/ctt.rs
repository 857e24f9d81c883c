//! Classical test theory - scale reliability and item statistics
//!
//! Item responses come in as a frame with one numeric column per item and
//! one row per respondent. Respondents missing any item are dropped
//! (listwise) before any statistic is computed.

use faer::Mat;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::pipeline::column_to_f64_vec;
use crate::stats::{mean, pearson_correlation, sample_variance};

const POWER_ITERATION_MAX_ITER: usize = 1000;
const POWER_ITERATION_TOLERANCE: f64 = 1e-12;

/// Complete-case item responses, stored column by column
struct ItemResponses {
    names: Vec<String>,
    items: Vec<Vec<f64>>,
}

impl ItemResponses {
    fn from_frame(df: &DataFrame, min_items: usize) -> AnalysisResult<Self> {
        let k = df.width();
        if k < min_items {
            return Err(AnalysisError::insufficient_data(format!(
                "need at least {} items, got {}",
                min_items, k
            )));
        }

        let mut names = Vec::with_capacity(k);
        let mut raw = Vec::with_capacity(k);
        for col in df.get_columns() {
            names.push(col.name().to_string());
            raw.push(column_to_f64_vec(col)?);
        }

        let complete: Vec<usize> = (0..df.height())
            .filter(|&row| raw.iter().all(|item| item[row].is_some_and(f64::is_finite)))
            .collect();

        let dropped = df.height() - complete.len();
        if dropped > 0 {
            warn!(
                respondents = dropped,
                "respondents with missing item responses were excluded"
            );
        }

        if complete.len() < 2 {
            return Err(AnalysisError::insufficient_data(format!(
                "need at least 2 complete respondents, got {}",
                complete.len()
            )));
        }

        let items = raw
            .iter()
            .map(|item| complete.iter().filter_map(|&row| item[row]).collect::<Vec<f64>>())
            .collect();

        Ok(Self { names, items })
    }

    fn respondents(&self) -> usize {
        self.items.first().map_or(0, Vec::len)
    }

    /// Total score of every respondent, optionally leaving one item out
    fn totals(&self, skip: Option<usize>) -> Vec<f64> {
        let mut totals = vec![0.0; self.respondents()];
        for (j, item) in self.items.iter().enumerate() {
            if Some(j) == skip {
                continue;
            }
            for (total, x) in totals.iter_mut().zip(item) {
                *total += x;
            }
        }
        totals
    }

    fn alpha(&self, skip: Option<usize>) -> AnalysisResult<f64> {
        let k = self.items.len() - usize::from(skip.is_some());
        if k < 2 {
            return Err(AnalysisError::insufficient_data(
                "Cronbach's alpha needs at least 2 items",
            ));
        }

        let mut sum_item_var = 0.0;
        for (j, item) in self.items.iter().enumerate() {
            if Some(j) != skip {
                sum_item_var += sample_variance(item)?;
            }
        }

        let total_var = sample_variance(&self.totals(skip))?;
        if total_var == 0.0 {
            return Err(AnalysisError::undefined(
                "total score variance is zero; Cronbach's alpha is undefined",
            ));
        }

        let k = k as f64;
        Ok((k / (k - 1.0)) * (1.0 - sum_item_var / total_var))
    }

    /// Item correlation matrix built as Z'Z from standardized items
    fn correlation_matrix(&self) -> AnalysisResult<Mat<f64>> {
        let n = self.respondents();
        let k = self.items.len();

        let mut z = Mat::<f64>::zeros(n, k);
        for (j, item) in self.items.iter().enumerate() {
            let m = mean(item)?;
            let ss: f64 = item.iter().map(|x| (x - m) * (x - m)).sum();
            if ss == 0.0 {
                return Err(AnalysisError::undefined(format!(
                    "item '{}' has zero variance; its correlations are undefined",
                    self.names[j]
                )));
            }
            let scale = ss.sqrt();
            for (i, x) in item.iter().enumerate() {
                z[(i, j)] = (x - m) / scale;
            }
        }

        Ok(z.transpose() * &z)
    }
}

/// Cronbach's alpha of a scale: `k/(k-1) * (1 - sum(var(item)) / var(total))`
pub fn cronbachs_alpha(items: &DataFrame) -> AnalysisResult<f64> {
    let responses = ItemResponses::from_frame(items, 2)?;
    let alpha = responses.alpha(None)?;
    debug!(
        items = responses.items.len(),
        respondents = responses.respondents(),
        alpha,
        "computed Cronbach's alpha"
    );
    Ok(alpha)
}

/// Statistics for one item of a scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStatistics {
    pub item: String,
    /// Mean response (proportion correct for 0/1 items)
    pub difficulty: f64,
    /// Corrected item-total correlation: item against the total of the other items
    pub citr: f64,
    /// Alpha of the scale with this item removed
    pub alpha_if_deleted: f64,
    /// Loading on the first principal component of the item correlations
    pub loading: f64,
}

/// Scale reliability with per-item statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAnalysis {
    pub alpha: f64,
    pub respondents: usize,
    pub items: Vec<ItemStatistics>,
}

impl ItemAnalysis {
    /// One row per item: `item`, `difficulty`, `citr`, `alpha_if_deleted`, `loading`
    pub fn to_dataframe(&self) -> AnalysisResult<DataFrame> {
        let names: Vec<&str> = self.items.iter().map(|i| i.item.as_str()).collect();
        let difficulty: Vec<f64> = self.items.iter().map(|i| i.difficulty).collect();
        let citr: Vec<f64> = self.items.iter().map(|i| i.citr).collect();
        let alpha_if_deleted: Vec<f64> = self.items.iter().map(|i| i.alpha_if_deleted).collect();
        let loading: Vec<f64> = self.items.iter().map(|i| i.loading).collect();

        let df = DataFrame::new(vec![
            Column::new("item".into(), names),
            Column::new("difficulty".into(), difficulty),
            Column::new("citr".into(), citr),
            Column::new("alpha_if_deleted".into(), alpha_if_deleted),
            Column::new("loading".into(), loading),
        ])?;
        Ok(df)
    }
}

/// Item analysis of a scale.
///
/// Needs at least 3 items so that alpha stays defined with any one removed.
pub fn item_analysis(items: &DataFrame) -> AnalysisResult<ItemAnalysis> {
    let responses = ItemResponses::from_frame(items, 3)?;
    let alpha = responses.alpha(None)?;
    let loadings = first_component_loadings(&responses.correlation_matrix()?)?;

    let mut stats = Vec::with_capacity(responses.items.len());
    for (j, item) in responses.items.iter().enumerate() {
        let rest = responses.totals(Some(j));
        stats.push(ItemStatistics {
            item: responses.names[j].clone(),
            difficulty: mean(item)?,
            citr: pearson_correlation(item, &rest)?,
            alpha_if_deleted: responses.alpha(Some(j))?,
            loading: loadings[j],
        });
    }

    debug!(items = stats.len(), alpha, "completed item analysis");

    Ok(ItemAnalysis {
        alpha,
        respondents: responses.respondents(),
        items: stats,
    })
}

/// Loadings on the dominant eigenvector of a correlation matrix.
///
/// Found by power iteration; loadings are `v * sqrt(lambda)`, signed so they
/// sum to a non-negative value.
fn first_component_loadings(corr: &Mat<f64>) -> AnalysisResult<Vec<f64>> {
    let k = corr.nrows();
    let start = 1.0 / (k as f64).sqrt();
    let mut v = Mat::<f64>::from_fn(k, 1, |_, _| start);
    let mut eigenvalue = 0.0;

    for _ in 0..POWER_ITERATION_MAX_ITER {
        let w = corr * &v;
        let norm = (0..k).map(|i| w[(i, 0)] * w[(i, 0)]).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(AnalysisError::undefined(
                "item correlation matrix is degenerate; loadings are undefined",
            ));
        }

        let mut change = 0.0;
        for i in 0..k {
            let next = w[(i, 0)] / norm;
            change += (next - v[(i, 0)]).abs();
            v[(i, 0)] = next;
        }
        eigenvalue = norm;

        if change < POWER_ITERATION_TOLERANCE {
            break;
        }
    }

    let sign = if (0..k).map(|i| v[(i, 0)]).sum::<f64>() < 0.0 {
        -1.0
    } else {
        1.0
    };
    let scale = sign * eigenvalue.sqrt();

    Ok((0..k).map(|i| v[(i, 0)] * scale).collect())
}
