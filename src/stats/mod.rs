//! Statistics module - exact tests, descriptive and robust statistics

pub mod descriptive;
pub mod exact;
pub mod robust;

pub use descriptive::*;
pub use exact::*;
pub use robust::*;
