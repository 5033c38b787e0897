//! The labeled observation table and its column-wise transformations.

pub mod table;
pub mod transform;

pub use table::*;
