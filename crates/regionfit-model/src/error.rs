//! Error types for model loading and compilation.

use std::io;
use std::path::PathBuf;

use regionfit_core::RegionError;
use thiserror::Error;

use crate::compiler::CompilationError;
use crate::lp_format::LpFormatError;

/// Errors raised while building or loading a [`ConstraintModel`](crate::ConstraintModel).
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    LpFormat(#[from] LpFormatError),

    /// The LP artifact is older than the source it was compiled from.
    #[error("Artifact {artifact} is older than its source {source_path}")]
    StaleArtifact {
        source_path: PathBuf,
        artifact: PathBuf,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Region(#[from] RegionError),
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ModelError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
