//! Engine error types.
//!
//! Every failure carries enough context (column name, grouping-key value,
//! channel) to localize the offending cell without re-running the analysis.
//! No operation substitutes a placeholder value (zero, NaN) for an error.

use thiserror::Error;

/// Which of the three column classes a name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    Descriptor,
    Predictor,
    Channel,
}

impl std::fmt::Display for ColumnClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ColumnClass::Descriptor => "descriptor",
            ColumnClass::Predictor => "predictor",
            ColumnClass::Channel => "channel",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A named column is absent from the mapping it was looked up in.
    #[error("unknown {class} column '{name}'")]
    UnknownColumn { class: ColumnClass, name: String },

    /// A rename would shadow an existing column name.
    #[error("column '{name}' already exists")]
    DuplicateColumn { name: String },

    /// Two tables (or two columns) that must correspond row-for-row do not.
    #[error("shape mismatch: {detail}")]
    ShapeMismatch { detail: String },

    /// The design matrix for one grouping-key x channel fit is rank deficient
    /// (collinear predictors, or fewer observations than parameters).
    #[error("singular design for group [{group}], channel '{channel}'")]
    SingularDesign { group: String, channel: String },

    /// Estimation was requested for a grouping-key value no model was fit for.
    #[error("no fitted model for group [{group}]")]
    MissingModel { group: String },

    /// Z-scoring a constant column would divide by zero.
    #[error("predictor '{column}' has zero variance")]
    ZeroVariance { column: String },
}

pub type Result<T> = std::result::Result<T, Error>;
