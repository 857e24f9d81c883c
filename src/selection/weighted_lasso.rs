//! Weighted-Lasso regression
//!
//! Least absolute deviation regression with a lasso penalty whose strength is
//! set per predictor. Raising a predictor's penalty weight discourages the
//! model from relying on it (for example a predictor with large group
//! differences) while still fitting for accuracy. The penalty only shapes
//! the fit; prediction uses the coefficients alone.
//!
//! The cost `sum|y - Xw - b| + alpha * n * sum|a_j * w_j|` is piecewise linear,
//! so it is minimised exactly as a linear program:
//!
//! ```text
//! minimise    sum(r_i) + alpha * n * sum(a_j * t_j)
//! subject to  r_i >= y_i - (x_i . w + b),   r_i >= (x_i . w + b) - y_i
//!             t_j >= w_j,                   t_j >= -w_j
//!             r_i, t_j >= 0
//! ```

use faer::Mat;
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, Solution, SolverModel,
    Variable,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::pipeline::{column_to_f64_vec, require_column};
use crate::stats::pearson_correlation;

/// Weighted-Lasso regression settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedLasso {
    /// Overall strength of the penalty (0 gives plain LAD regression)
    pub alpha: f64,
    /// Penalty weight per predictor; `None` weighs every predictor 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_weights: Option<Vec<f64>>,
}

/// Fit quality on a data set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitScore {
    pub rmse: f64,
    pub mae: f64,
    /// Correlation of predictions with the criterion
    pub r: f64,
}

/// A fitted weighted-Lasso model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedWeightedLasso {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl WeightedLasso {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            alpha_weights: None,
        }
    }

    pub fn with_alpha_weights(mut self, weights: Vec<f64>) -> Self {
        self.alpha_weights = Some(weights);
        self
    }

    fn penalty_weights(&self, predictors: usize) -> AnalysisResult<Vec<f64>> {
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(AnalysisError::configuration(format!(
                "alpha must be a non-negative number, got {}",
                self.alpha
            )));
        }

        match &self.alpha_weights {
            None => Ok(vec![1.0; predictors]),
            Some(weights) if weights.len() != predictors => {
                Err(AnalysisError::configuration(format!(
                    "got {} alpha weights for {} predictors",
                    weights.len(),
                    predictors
                )))
            }
            Some(weights) => {
                if let Some(bad) = weights.iter().find(|a| !(a.is_finite() && **a >= 0.0)) {
                    return Err(AnalysisError::configuration(format!(
                        "alpha weights must be non-negative numbers, got {}",
                        bad
                    )));
                }
                Ok(weights.clone())
            }
        }
    }

    /// Fit the model to predictors `x` (one row per case) and criterion `y`
    pub fn fit(&self, x: &Mat<f64>, y: &[f64]) -> AnalysisResult<FittedWeightedLasso> {
        let n = x.nrows();
        let k = x.ncols();

        if n == 0 {
            return Err(AnalysisError::insufficient_data(
                "cannot fit a regression without any cases",
            ));
        }
        if y.len() != n {
            return Err(AnalysisError::configuration(format!(
                "predictors have {} rows but the criterion has {} values",
                n,
                y.len()
            )));
        }
        let penalty = self.penalty_weights(k)?;
        check_finite(x, y)?;

        let mut vars = ProblemVariables::new();
        let intercept = vars.add(variable());
        let weights: Vec<Variable> = (0..k).map(|_| vars.add(variable())).collect();
        let residuals: Vec<Variable> = (0..n).map(|_| vars.add(variable().min(0.0))).collect();
        let magnitudes: Vec<Variable> = (0..k).map(|_| vars.add(variable().min(0.0))).collect();

        let scale = self.alpha * n as f64;
        let residual_cost: Expression = residuals.iter().copied().sum();
        let penalty_cost: Expression = magnitudes
            .iter()
            .zip(&penalty)
            .map(|(t, a)| (scale * a) * *t)
            .sum();

        let mut problem = vars
            .minimise(residual_cost + penalty_cost)
            .using(default_solver);

        for (i, &r) in residuals.iter().enumerate() {
            let mut fitted = Expression::from(intercept);
            for (j, &w) in weights.iter().enumerate() {
                fitted += x[(i, j)] * w;
            }

            let target = y[i];
            let neg_target = -y[i];
            let above: Expression = r + fitted.clone();
            let below: Expression = r - fitted;
            problem = problem.with(constraint!(above >= target));
            problem = problem.with(constraint!(below >= neg_target));
        }

        for (&t, &w) in magnitudes.iter().zip(&weights) {
            let above: Expression = t - w;
            let below: Expression = t + w;
            problem = problem.with(constraint!(above >= 0.0));
            problem = problem.with(constraint!(below >= 0.0));
        }

        let solution = problem
            .solve()
            .map_err(|e| AnalysisError::Solver(format!("weighted lasso: {}", e)))?;

        let fitted = FittedWeightedLasso {
            intercept: solution.value(intercept),
            coefficients: weights.iter().map(|&w| solution.value(w)).collect(),
        };

        debug!(
            cases = n,
            predictors = k,
            alpha = self.alpha,
            intercept = fitted.intercept,
            "fitted weighted lasso"
        );

        Ok(fitted)
    }
}

fn check_finite(x: &Mat<f64>, y: &[f64]) -> AnalysisResult<()> {
    for i in 0..x.nrows() {
        for j in 0..x.ncols() {
            if !x[(i, j)].is_finite() {
                return Err(AnalysisError::configuration(format!(
                    "predictor value at row {}, column {} is not finite",
                    i, j
                )));
            }
        }
    }
    if let Some(i) = y.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::configuration(format!(
            "criterion value at row {} is not finite",
            i
        )));
    }
    Ok(())
}

impl FittedWeightedLasso {
    /// Predictions `Xw + b`
    pub fn predict(&self, x: &Mat<f64>) -> AnalysisResult<Vec<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(AnalysisError::configuration(format!(
                "model has {} coefficients but the predictors have {} columns",
                self.coefficients.len(),
                x.ncols()
            )));
        }

        Ok((0..x.nrows())
            .map(|i| {
                self.coefficients
                    .iter()
                    .enumerate()
                    .fold(self.intercept, |acc, (j, w)| acc + x[(i, j)] * w)
            })
            .collect())
    }

    /// RMSE, MAE and correlation of the predictions for `x` against `y`
    pub fn score(&self, x: &Mat<f64>, y: &[f64]) -> AnalysisResult<FitScore> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() {
            return Err(AnalysisError::configuration(format!(
                "predictors have {} rows but the criterion has {} values",
                predictions.len(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(AnalysisError::insufficient_data("cannot score an empty sample"));
        }

        let n = y.len() as f64;
        let (sq, abs) = y
            .iter()
            .zip(&predictions)
            .fold((0.0, 0.0), |(sq, abs), (obs, pred)| {
                let resid = obs - pred;
                (sq + resid * resid, abs + resid.abs())
            });

        Ok(FitScore {
            rmse: (sq / n).sqrt(),
            mae: abs / n,
            r: pearson_correlation(y, &predictions)?,
        })
    }
}

/// Build a predictor matrix from numeric columns of a frame, one row per record
pub fn design_matrix(df: &DataFrame, columns: &[&str]) -> AnalysisResult<Mat<f64>> {
    let mut x = Mat::<f64>::zeros(df.height(), columns.len());

    for (j, name) in columns.iter().enumerate() {
        let values = column_to_f64_vec(require_column(df, name)?)?;
        for (i, value) in values.into_iter().enumerate() {
            x[(i, j)] = value.ok_or_else(|| {
                AnalysisError::insufficient_data(format!(
                    "predictor '{}' is missing a value at row {}",
                    name, i
                ))
            })?;
        }
    }

    Ok(x)
}
