//! RegionFit Fitness
//!
//! Scores candidate constraint models against reference data:
//!
//! - **Recall**: share of reference rows the candidate accepts, via the
//!   feasibility oracle
//! - **Precision**: overlap between the reference and an equal-sized sample
//!   of the candidate's own region ([`PrecisionMetric`])
//! - **Fitness**: the two combined by a [`ScoringPolicy`]
//!
//! [`CandidateScorer`] is the entry point for a search loop. It merges each
//! phenotype into the ground-truth template, compiles it, scores it, and
//! turns every failure into the worst fitness.

pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod metric;
pub mod policy;
pub mod scorer;
pub mod template;

pub use dataset::{Dataset, Distribution, ReferenceSet, CLASS_COLUMN};
pub use error::{EvaluationError, Result};
pub use evaluator::{ConfusionMatrix, FitnessEvaluator};
pub use metric::{NearestNeighbourOverlap, PrecisionMetric};
pub use policy::{HarmonicMeanPolicy, ScoringPolicy};
pub use scorer::{Candidate, CandidateScorer, WORST_FITNESS};
pub use template::CandidateTemplate;
