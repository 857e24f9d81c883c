//! Report module - presenting analysis results

pub mod export;
pub mod impact_report;
pub mod summary;

pub use export::*;
pub use impact_report::*;
