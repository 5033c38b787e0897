//! `rerps` — regression-based estimation of event-related brain potential
//! (rERP) waveforms, as proposed in:
//!
//! Smith, N.J., Kutas, M., Regression-based estimation of ERP waveforms: I.
//!     The rERP framework, Psychophysiology, 2015, Vol. 52, pp. 157-168
//!
//! Smith, N.J., Kutas, M., Regression-based estimation of ERP waveforms: II.
//!     Non-linear effects, overlap correction, and practical considerations,
//!     Psychophysiology, 2015, Vol. 52, pp. 169-181
//!
//! For each electrode and time sample, a linear model relates observed
//! voltage to continuous stimulus predictors (plausibility, association
//! strength, cloze probability, ...). The fitted models yield estimated
//! waveforms, residuals, and coefficient trajectories.
//!
//! This crate is the data-modeling engine only: the labeled table, its
//! column transforms, the per-group OLS fits, estimation/residuals, and
//! hierarchical mean/SEM aggregation. File ingestion, figure rendering, and
//! run orchestration live with the caller. A typical pass:
//!
//! ```no_run
//! use rerps::{DataSet, DataSummary, ModelSummary};
//! use rerps::fit::{estimate, regress, residuals};
//!
//! # fn demo(mut data: DataSet) -> rerps::Result<()> {
//! data.invert_predictor("plausibility", 7.0)?;
//! data.zscore_predictor("plausibility")?;
//!
//! let models = regress(&data, &["Subject", "Timestamp"], &["plausibility"])?;
//! let estimated = estimate(&data, &models)?;
//! let residual = residuals(&data, &estimated)?;
//!
//! // Two-stage averaging: within subject first, then across subjects.
//! let per_subject = DataSummary::new(&estimated, &["Condition", "Subject", "Timestamp"])?;
//! let grand = per_subject.resummarize(&["Condition", "Timestamp"])?;
//!
//! let coefficients = ModelSummary::new(&models, &["Timestamp"])?;
//! # let _ = (residual, grand, coefficients);
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod fit;
pub mod math;
pub mod report;
pub mod summary;

pub use data::{Cell, ColumnMap, DataSet};
pub use error::{ColumnClass, Error, Result};
pub use fit::{CoefficientMap, FitStats, INTERCEPT, ModelSet, estimate, regress, residuals};
pub use summary::{DataSummary, ErrorBand, ModelSummary};
