//! Error types for RegionFit core types

use thiserror::Error;

/// Errors raised while building or querying regions and sample sets.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegionError {
    /// A variable name was referenced that the region does not declare.
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// A variable name was declared twice.
    #[error("Duplicate variable: {0}")]
    DuplicateVariable(String),

    /// Lower bound exceeds upper bound, or a bound is NaN.
    #[error("Invalid bounds for {name}: [{lower}, {upper}]")]
    InvalidBounds {
        name: String,
        lower: f64,
        upper: f64,
    },

    /// A declared variable has an infinite bound.
    #[error("Variable {0} must have finite bounds")]
    UnboundedVariable(String),

    /// A point or row had the wrong number of values.
    #[error("Dimension mismatch: expected {expected} values, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A table could not be parsed.
    #[error("Malformed data at line {line}: {message}")]
    MalformedData { line: usize, message: String },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, RegionError>;
