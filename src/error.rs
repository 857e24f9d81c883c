//! Error types for selection analyses.
//!
//! Every stage of the adverse impact pipeline (and the psychometric and
//! regression helpers) reports failures through `AnalysisError`. Each variant
//! captures one class of deterministic failure so callers can tell a bad
//! configuration apart from data that cannot support a statistic.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur while running an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The analysis was configured inconsistently.
    ///
    /// Examples: both (or neither) of a cutscore and passing labels were given,
    /// an explicit referent that was never observed, a malformed filter.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The data cannot support the requested computation.
    ///
    /// Raised when no group meets the referent sample-size floor, or when a
    /// statistic is requested for a group or sample with no observations.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A statistic is mathematically undefined for this input.
    ///
    /// Raised instead of returning NaN or infinity, e.g. an impact ratio
    /// against a referent with a zero selection rate, or a standardized score
    /// over a zero-variance sample.
    #[error("Undefined statistic: {0}")]
    UndefinedStatistic(String),

    /// Table access failed (missing column, failed cast, ...).
    #[error("DataFrame error: {0}")]
    Polars(#[from] PolarsError),

    /// The linear programming solver did not produce a solution.
    #[error("Solver error: {0}")]
    Solver(String),

    /// JSON (de)serialization of a configuration failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AnalysisError::Configuration(message.into())
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        AnalysisError::InsufficientData(message.into())
    }

    pub fn undefined(message: impl Into<String>) -> Self {
        AnalysisError::UndefinedStatistic(message.into())
    }

    /// Whether this error stems from how the analysis was configured
    /// rather than from the data itself.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AnalysisError::Configuration(_))
    }
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
