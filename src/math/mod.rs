//! Mathematical utilities: least-squares solving and summary statistics.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
