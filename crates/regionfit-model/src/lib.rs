//! RegionFit Model
//!
//! A [`ConstraintModel`] is what the samplers and the fitness evaluator work
//! on: the full LP region compiled from a candidate, the subset of declared
//! variables that data columns refer to, and an optional fast evaluator.
//!
//! All temporary relaxations go through [`RegionScope`], which restores the
//! region when dropped.

pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod lp_format;
mod model;
mod scope;

pub use compiler::{CompilationError, CompiledArtifacts, ModelCompiler, ZimplCompiler};
pub use error::{ModelError, Result};
pub use evaluator::{ConstraintEvaluator, LinearEvaluator};
pub use lp_format::{LpFormatError, LpProblem};
pub use model::ConstraintModel;
pub use scope::{DomainCoercion, RegionScope};
