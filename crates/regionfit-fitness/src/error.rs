//! Error types for fitness evaluation.

use std::io;
use std::path::PathBuf;

use regionfit_core::RegionError;
use regionfit_model::{CompilationError, ModelError};
use regionfit_sampler::SamplingError;
use thiserror::Error;

/// Errors raised while scoring a candidate against reference data.
///
/// [`CandidateScorer`](crate::CandidateScorer) never lets these escape; it
/// turns them into the worst fitness.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A reference row is labelled as infeasible in its `class` column.
    #[error("Reference row {row} is labelled infeasible; reference data must be all positive")]
    InfeasibleReferenceRow { row: usize },

    #[error("Reference set has no rows")]
    EmptyReference,

    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EvaluationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the candidate itself failed to compile.
    pub fn is_compilation_failure(&self) -> bool {
        matches!(
            self,
            Self::Compilation(_) | Self::Model(ModelError::Compilation(_))
        )
    }
}

/// Result type alias for fitness evaluation
pub type Result<T> = std::result::Result<T, EvaluationError>;
