//! RegionFit Sampler
//!
//! Sampling, membership and volume primitives over a
//! [`ConstraintModel`](regionfit_model::ConstraintModel):
//!
//! - [`BranchAndCutSampler`]: distinct points from the solver's solution pool
//! - [`HitAndRunSampler`]: a random walk for regions with continuous variables
//! - [`FeasibilityOracle`]: row-by-row membership tests
//! - [`VolumeEstimator`]: feasible fraction of the bounding box
//! - [`LabelledGenerator`]: uniform box draws labelled by feasibility
//!
//! Every temporary relaxation is made through a scope that restores the
//! model, so a model comes back unchanged from every call, including calls
//! that fail.

mod branch_and_cut;
pub mod error;
mod feasibility;
mod generator;
mod hit_and_run;
mod rng;
mod volume;

pub use branch_and_cut::BranchAndCutSampler;
pub use error::{Result, SamplingError};
pub use feasibility::FeasibilityOracle;
pub use generator::LabelledGenerator;
pub use hit_and_run::HitAndRunSampler;
pub use rng::{RngScope, SamplerRng};
pub use volume::{VolumeEstimate, VolumeEstimator, VolumeMethod};
