//! Selection module - predictor weighting for selection models

pub mod weighted_lasso;

pub use weighted_lasso::*;
