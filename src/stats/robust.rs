//! Standardized and robust scores for outlier screening

use serde::{Deserialize, Serialize};

use super::descriptive::{mean, median, median_abs_deviation, quantile, sample_std, MAD_NORMAL_SCALE};
use crate::error::{AnalysisError, AnalysisResult};

/// Default tail probability for the IQR score (25th/75th percentiles)
pub const DEFAULT_IQR_TAIL: f64 = 0.25;

/// Scoring method used when screening a numeric column for outliers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreMethod {
    /// Classical z-score: (x - mean) / sd
    Standard,
    /// Hampel identifier: (x - median) / (1.4826 * MAD)
    #[default]
    Hampel,
    /// Interquartile score: (x - median) / (Q(1 - tail) - Q(tail))
    Iqr { tail: f64 },
}

impl ScoreMethod {
    /// Score every value with this method
    pub fn score(&self, values: &[f64]) -> AnalysisResult<Vec<f64>> {
        match self {
            ScoreMethod::Standard => standard_score(values),
            ScoreMethod::Hampel => hampel_identifier(values),
            ScoreMethod::Iqr { tail } => iqr_score(values, *tail),
        }
    }
}

impl std::fmt::Display for ScoreMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreMethod::Standard => write!(f, "standard"),
            ScoreMethod::Hampel => write!(f, "hampel"),
            ScoreMethod::Iqr { tail } => write!(f, "iqr({})", tail),
        }
    }
}

fn require_scorable(values: &[f64]) -> AnalysisResult<()> {
    if values.len() < 2 {
        return Err(AnalysisError::insufficient_data(format!(
            "scoring needs at least 2 observations, got {}",
            values.len()
        )));
    }
    Ok(())
}

fn rescale(values: &[f64], center: f64, scale: f64, what: &str) -> AnalysisResult<Vec<f64>> {
    if scale == 0.0 || !scale.is_finite() {
        return Err(AnalysisError::undefined(format!(
            "{} is zero; scores are undefined",
            what
        )));
    }
    Ok(values.iter().map(|x| (x - center) / scale).collect())
}

/// Standard score (z-score) using the sample standard deviation
pub fn standard_score(values: &[f64]) -> AnalysisResult<Vec<f64>> {
    require_scorable(values)?;
    let center = mean(values)?;
    let scale = sample_std(values)?;
    rescale(values, center, scale, "standard deviation")
}

/// Hampel identifier: deviation from the median in units of the
/// normal-consistent median absolute deviation.
pub fn hampel_identifier(values: &[f64]) -> AnalysisResult<Vec<f64>> {
    require_scorable(values)?;
    let center = median(values)?;
    let scale = median_abs_deviation(values)? * MAD_NORMAL_SCALE;
    rescale(values, center, scale, "median absolute deviation")
}

/// Interquartile score: deviation from the median in units of the
/// `Q(1 - tail) - Q(tail)` range.
pub fn iqr_score(values: &[f64], tail: f64) -> AnalysisResult<Vec<f64>> {
    if !(tail > 0.0 && tail < 0.5) {
        return Err(AnalysisError::configuration(format!(
            "IQR tail must be in (0.0, 0.5), got {}",
            tail
        )));
    }
    require_scorable(values)?;
    let center = median(values)?;
    let scale = quantile(values, 1.0 - tail)? - quantile(values, tail)?;
    rescale(values, center, scale, "interquartile range")
}
