//! Error types for solver oracle calls.

use std::time::Duration;

use regionfit_core::RegionError;
use thiserror::Error;

/// Errors raised by a [`SolverOracle`](crate::SolverOracle) call.
///
/// Every variant is fatal for the call that raised it. Infeasibility and
/// unboundedness are not errors; they are [`Optimum`](crate::Optimum)
/// outcomes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OracleError {
    /// The call exceeded its wall-clock ceiling.
    #[error("Solver call exceeded its time limit of {limit:?}")]
    Timeout { limit: Duration },

    /// The node budget ran out before any feasible point was found.
    #[error("Solver exhausted its node limit of {limit} without an incumbent")]
    NodeLimit { limit: usize },

    /// The LP/MILP backend failed for a reason other than infeasibility
    /// or unboundedness.
    #[error("Solver backend failed: {0}")]
    Backend(String),

    /// The problem handed to the oracle is not well formed.
    #[error("Malformed problem: {0}")]
    Malformed(String),

    #[error(transparent)]
    Region(#[from] RegionError),
}

/// Result type alias for oracle calls
pub type Result<T> = std::result::Result<T, OracleError>;
