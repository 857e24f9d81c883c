//! iopsy: Personnel-Selection Statistics
//!
//! A library for auditing and building selection procedures: adverse impact
//! analysis (four-fifths rule and exact tests against a referent group),
//! record filtering with robust outlier scores, classical test theory and
//! Rasch item statistics, and weighted-Lasso predictor weighting.
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod psychometrics;
pub mod report;
pub mod selection;
pub mod stats;

pub use config::AdverseImpactConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use pipeline::{run_adverse_impact, run_adverse_impact_batch, PassRule, RecordFilter};
pub use report::AdverseImpactReport;
