//! Psychometrics module - classical test theory and item response theory

pub mod ctt;
pub mod irt;

pub use ctt::*;
pub use irt::*;
