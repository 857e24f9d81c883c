//! Pipeline module - the adverse impact analysis stages

pub mod adverse_impact;
pub mod columns;
pub mod filters;
pub mod groups;
pub mod impact;
pub mod outcome;
pub mod referent;

pub use adverse_impact::*;
pub use columns::*;
pub use filters::*;
pub use groups::*;
pub use impact::*;
pub use outcome::*;
pub use referent::*;
