//! Descriptive statistics over plain slices
//!
//! Values are expected to be finite; callers strip nulls before calling in.

use crate::error::{AnalysisError, AnalysisResult};

/// Scale factor making the MAD a consistent estimator of the standard
/// deviation for normally distributed data (1 / Φ⁻¹(3/4)).
pub const MAD_NORMAL_SCALE: f64 = 1.482_602_218_505_602;

/// Arithmetic mean
pub fn mean(values: &[f64]) -> AnalysisResult<f64> {
    if values.is_empty() {
        return Err(AnalysisError::insufficient_data(
            "cannot compute the mean of an empty sample",
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (denominator n - 1)
pub fn sample_variance(values: &[f64]) -> AnalysisResult<f64> {
    let n = values.len();
    if n < 2 {
        return Err(AnalysisError::insufficient_data(format!(
            "sample variance needs at least 2 observations, got {}",
            n
        )));
    }

    // Two-pass for numerical stability
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|x| (x - m) * (x - m)).sum();
    Ok(ss / (n - 1) as f64)
}

/// Sample standard deviation (denominator n - 1)
pub fn sample_std(values: &[f64]) -> AnalysisResult<f64> {
    sample_variance(values).map(f64::sqrt)
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile with linear interpolation between order statistics.
///
/// Matches the default ("linear", Hyndman-Fan type 7) definition used by
/// numpy and pandas: `h = (n - 1) * q`, interpolating between
/// `x[floor(h)]` and `x[floor(h) + 1]`.
pub fn quantile(values: &[f64], q: f64) -> AnalysisResult<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(AnalysisError::configuration(format!(
            "quantile must be between 0.0 and 1.0, got {}",
            q
        )));
    }
    if values.is_empty() {
        return Err(AnalysisError::insufficient_data(
            "cannot compute a quantile of an empty sample",
        ));
    }

    let sorted = sorted_copy(values);
    Ok(quantile_sorted(&sorted, q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Median (average of the two middle values for even sample sizes)
pub fn median(values: &[f64]) -> AnalysisResult<f64> {
    quantile(values, 0.5)
}

/// Raw median absolute deviation: `median(|x_i - median(x)|)`.
///
/// Multiply by [`MAD_NORMAL_SCALE`] for the normal-consistent version.
pub fn median_abs_deviation(values: &[f64]) -> AnalysisResult<f64> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|x| (x - center).abs()).collect();
    median(&deviations)
}

/// Pearson product-moment correlation of two aligned samples
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> AnalysisResult<f64> {
    if x.len() != y.len() {
        return Err(AnalysisError::configuration(format!(
            "correlation requires aligned samples, got lengths {} and {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(AnalysisError::insufficient_data(
            "correlation needs at least 2 paired observations",
        ));
    }

    let mean_x = mean(x)?;
    let mean_y = mean(y)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Err(AnalysisError::undefined(
            "correlation is undefined when either sample has zero variance",
        ));
    }

    Ok(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values).unwrap() - 5.0).abs() < TOL);
        // Population variance is 4.0, sample variance is 32/7
        assert!((sample_variance(&values).unwrap() - 32.0 / 7.0).abs() < TOL);
    }

    #[test]
    fn test_empty_and_single_samples() {
        assert!(matches!(mean(&[]), Err(AnalysisError::InsufficientData(_))));
        assert!(matches!(
            sample_variance(&[1.0]),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // h = 3 * 0.25 = 0.75 -> 1 + 0.75 * (2 - 1)
        assert!((quantile(&values, 0.25).unwrap() - 1.75).abs() < TOL);
        assert!((quantile(&values, 0.75).unwrap() - 3.25).abs() < TOL);
        assert!((quantile(&values, 0.0).unwrap() - 1.0).abs() < TOL);
        assert!((quantile(&values, 1.0).unwrap() - 4.0).abs() < TOL);
    }

    #[test]
    fn test_quantile_rejects_out_of_range() {
        assert!(quantile(&[1.0, 2.0], 1.5).unwrap_err().is_configuration());
    }

    #[test]
    fn test_median_odd_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_median_abs_deviation() {
        // median = 3, |deviations| = [2, 1, 0, 1, 97] -> median 1
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert_eq!(median_abs_deviation(&values).unwrap(), 1.0);
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let z = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!((pearson_correlation(&x, &y).unwrap() - 1.0).abs() < TOL);
        assert!((pearson_correlation(&x, &z).unwrap() + 1.0).abs() < TOL);
    }

    #[test]
    fn test_pearson_constant_is_undefined() {
        let x = [1.0, 2.0, 3.0];
        let y = [7.0, 7.0, 7.0];
        assert!(matches!(
            pearson_correlation(&x, &y),
            Err(AnalysisError::UndefinedStatistic(_))
        ));
    }
}
