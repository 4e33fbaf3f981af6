//! RegionFit Solver Oracle
//!
//! The samplers never talk to an LP/MILP engine directly. They go through the
//! [`SolverOracle`] strategy trait, which exposes exactly three primitives:
//!
//! - [`SolverOracle::optimize`]: best assignment for a linear objective
//! - [`SolverOracle::enumerate_pool`]: up to `K` feasible assignments,
//!   distinct on chosen integer columns, ranked by objective
//! - [`SolverOracle::check_feasible`]: feasibility of a (pinned) region
//!
//! [`HighsOracle`] solves through HiGHS via `good_lp` and builds its
//! solution pool as a best-first search over disjoint subproblems. Any other
//! engine can be plugged in by implementing the trait.
//!
//! # Example
//!
//! ```
//! use regionfit_core::{Objective, Region, Relation, Variable};
//! use regionfit_oracle::{HighsOracle, Optimum, OracleSettings, SolverOracle};
//!
//! let mut region = Region::new();
//! region.add_variable(Variable::integer("x", 0.0, 2.0).unwrap()).unwrap();
//! region.add_variable(Variable::integer("y", 0.0, 2.0).unwrap()).unwrap();
//! region
//!     .add_named_constraint(None, &[("x", 1.0), ("y", 1.0)], Relation::LessEq, 2.0)
//!     .unwrap();
//!
//! let oracle = HighsOracle::new(OracleSettings::default());
//! let best = oracle
//!     .optimize(&region, &Objective::maximize(vec![2.0, 1.0]))
//!     .unwrap();
//! assert_eq!(best, Optimum::Optimal { value: 4.0, assignment: vec![2.0, 0.0] });
//!
//! let pool = oracle.enumerate_pool(&region, &Objective::zero(2), 10, &[0, 1]).unwrap();
//! assert_eq!(pool.len(), 6);
//! ```

mod deadline;
pub mod error;
mod highs;
mod highs_oracle;
mod pool;

use std::time::Duration;

use regionfit_config::OracleConfig;
use regionfit_core::{Objective, Region};

pub use deadline::Deadline;
pub use error::{OracleError, Result};
pub use highs_oracle::HighsOracle;

/// Outcome of a single optimization.
#[derive(Debug, Clone, PartialEq)]
pub enum Optimum {
    /// An optimal assignment over all region variables and its objective value.
    Optimal { value: f64, assignment: Vec<f64> },
    /// No assignment satisfies the region.
    Infeasible,
    /// The objective improves without limit.
    Unbounded,
}

impl Optimum {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Optimum::Infeasible)
    }

    /// The optimal assignment, if any.
    pub fn assignment(&self) -> Option<&[f64]> {
        match self {
            Optimum::Optimal { assignment, .. } => Some(assignment),
            _ => None,
        }
    }

    /// The optimal objective value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Optimum::Optimal { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// An LP/MILP engine seen through the three primitives the samplers need.
///
/// Every call is synchronous and bounded by the implementation's wall-clock
/// ceiling. Implementations must not keep per-call state between calls; all
/// inputs arrive through `region` and `objective`.
pub trait SolverOracle: Send + Sync {
    /// Optimizes `objective` over `region`, honoring integer domains.
    fn optimize(&self, region: &Region, objective: &Objective) -> Result<Optimum>;

    /// Returns up to `max_count` feasible assignments, best objective first.
    ///
    /// No two assignments agree on every integer-typed column listed in
    /// `distinct`; other columns, auxiliary ones included, are free. When
    /// `distinct` names no integer column the pool holds at most one
    /// assignment. Search effort is capped, so the pool may be shorter than
    /// the true solution count.
    fn enumerate_pool(
        &self,
        region: &Region,
        objective: &Objective,
        max_count: usize,
        distinct: &[usize],
    ) -> Result<Vec<Vec<f64>>>;

    /// Whether `region` admits any assignment.
    fn check_feasible(&self, region: &Region) -> Result<bool>;
}

impl<O: SolverOracle + ?Sized> SolverOracle for &O {
    fn optimize(&self, region: &Region, objective: &Objective) -> Result<Optimum> {
        (**self).optimize(region, objective)
    }

    fn enumerate_pool(
        &self,
        region: &Region,
        objective: &Objective,
        max_count: usize,
        distinct: &[usize],
    ) -> Result<Vec<Vec<f64>>> {
        (**self).enumerate_pool(region, objective, max_count, distinct)
    }

    fn check_feasible(&self, region: &Region) -> Result<bool> {
        (**self).check_feasible(region)
    }
}

impl<O: SolverOracle + ?Sized> SolverOracle for Box<O> {
    fn optimize(&self, region: &Region, objective: &Objective) -> Result<Optimum> {
        (**self).optimize(region, objective)
    }

    fn enumerate_pool(
        &self,
        region: &Region,
        objective: &Objective,
        max_count: usize,
        distinct: &[usize],
    ) -> Result<Vec<Vec<f64>>> {
        (**self).enumerate_pool(region, objective, max_count, distinct)
    }

    fn check_feasible(&self, region: &Region) -> Result<bool> {
        (**self).check_feasible(region)
    }
}

/// Knobs of the in-process oracle, consumed once at session start.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleSettings {
    /// Wall-clock ceiling per call.
    pub time_limit: Duration,
    /// Subproblem solves per pool enumeration.
    pub node_limit: usize,
    /// Feasibility and integrality tolerance.
    pub tolerance: f64,
    /// Log per-call statistics at debug level.
    pub log_to_console: bool,
    /// Worker threads handed to the backend per solve.
    pub threads: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self::from(&OracleConfig::default())
    }
}

impl From<&OracleConfig> for OracleSettings {
    fn from(config: &OracleConfig) -> Self {
        Self {
            time_limit: config.time_limit(),
            node_limit: config.node_limit,
            tolerance: config.tolerance,
            log_to_console: config.log_to_console,
            threads: config.threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_follow_config() {
        let config = OracleConfig {
            threads: 3,
            node_limit: 40,
            ..OracleConfig::default()
        };
        let settings = OracleSettings::from(&config);
        assert_eq!(settings.threads, 3);
        assert_eq!(settings.node_limit, 40);
        assert_eq!(settings.time_limit, config.time_limit());
    }

    #[test]
    fn test_multithreaded_backend_solves() {
        let oracle = HighsOracle::new(OracleSettings {
            threads: 2,
            ..OracleSettings::default()
        });
        let region = regionfit_test::triangle_grid();
        match oracle.optimize(&region, &Objective::maximize(vec![1.0, 1.0])).unwrap() {
            Optimum::Optimal { value, .. } => assert_eq!(value, 2.0),
            other => panic!("expected an optimum, got {other:?}"),
        }
    }
}
