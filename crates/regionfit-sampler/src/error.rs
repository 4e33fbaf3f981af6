//! Error types for sampling and volume estimation.

use regionfit_core::RegionError;
use regionfit_model::ModelError;
use regionfit_oracle::OracleError;
use thiserror::Error;

/// Errors raised by the samplers, the feasibility oracle and the volume
/// estimator.
///
/// An infeasible model is not an error: samplers return an empty set and
/// the volume estimator returns zero.
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Region(#[from] RegionError),

    /// A batch lacks a column for one of the model's declared variables.
    #[error("Batch has no column for declared variable '{0}'")]
    MissingColumn(String),
}

/// Result type alias for sampling operations
pub type Result<T> = std::result::Result<T, SamplingError>;
