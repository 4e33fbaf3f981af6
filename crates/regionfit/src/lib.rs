//! RegionFit - Constraint-Region Sampling & Fitness
//!
//! Samples points from linear/integer-constrained regions, tests points for
//! feasibility, estimates the relative volume of a region, and scores
//! candidate models against reference data.
//!
//! # Example
//!
//! ```rust
//! use regionfit::prelude::*;
//!
//! let mut region = Region::new();
//! region.add_variable(Variable::integer("x", 0.0, 2.0).unwrap()).unwrap();
//! region.add_variable(Variable::integer("y", 0.0, 2.0).unwrap()).unwrap();
//! region
//!     .add_named_constraint(Some("diag"), &[("x", 1.0), ("y", 1.0)], Relation::LessEq, 2.0)
//!     .unwrap();
//! let mut model = ConstraintModel::new(region, Objective::zero(2)).unwrap();
//!
//! let session = Session::new(EngineConfig::default().with_random_seed(1)).unwrap();
//! let points = session.branch_and_cut().sample(&mut model, 10, false).unwrap();
//! assert_eq!(points.len(), 6);
//! ```

mod session;

pub use session::{Session, SessionError};

pub use regionfit_config as config;
pub use regionfit_fitness as fitness;
pub use regionfit_model as model;
pub use regionfit_oracle as oracle;
pub use regionfit_sampler as sampler;

#[cfg(feature = "console")]
pub use regionfit_console as console;

pub use regionfit_config::{EngineConfig, SamplerPolicy, VolumeStrategy};
pub use regionfit_core::{
    DomainKind, LinearConstraint, Objective, Region, Relation, SampleSet, Sense, Variable,
};
pub use regionfit_fitness::{
    Candidate, CandidateScorer, CandidateTemplate, Dataset, Distribution, FitnessEvaluator,
    ReferenceSet,
};
pub use regionfit_model::{ConstraintModel, ModelCompiler, ZimplCompiler};
pub use regionfit_oracle::{Optimum, HighsOracle, SolverOracle};
pub use regionfit_sampler::{
    BranchAndCutSampler, FeasibilityOracle, HitAndRunSampler, LabelledGenerator, VolumeEstimate,
    VolumeEstimator, VolumeMethod,
};

pub mod prelude {
    pub use super::{
        ConstraintModel, EngineConfig, LinearConstraint, Objective, Region, Relation, SampleSet,
        Session, Variable,
    };
    pub use super::{Candidate, Distribution, ReferenceSet};
    pub use super::{SolverOracle, VolumeMethod};
}
