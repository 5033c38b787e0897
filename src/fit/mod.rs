//! Per-group regression fitting and model-based estimation.
//!
//! Responsibilities:
//!
//! - fit one OLS model per grouping-key value x channel ([`regress`])
//! - apply fitted models back onto a table ([`estimate`])
//! - compare an observed and an estimated table ([`residuals`])

pub mod estimate;
pub mod regress;

pub use estimate::*;
pub use regress::*;
