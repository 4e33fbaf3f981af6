use regionfit_core::{Objective, Region};
use tracing::debug;

use crate::deadline::Deadline;
use crate::error::{OracleError, Result};
use crate::highs::{self, MilpOutcome};
use crate::pool::PoolSearch;
use crate::{Optimum, OracleSettings, SolverOracle};

/// [`SolverOracle`] backed by HiGHS through `good_lp`.
///
/// `optimize` and `check_feasible` are single MILP solves. The solution
/// pool is a best-first search over disjoint subproblems, each one a HiGHS
/// solve counted against the node budget.
///
/// Stateless between calls; a single instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct HighsOracle {
    settings: OracleSettings,
}

impl HighsOracle {
    pub fn new(settings: OracleSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }

    fn solve_root(&self, call: &str, region: &Region, objective: &Objective) -> Result<MilpOutcome> {
        highs::check_objective(region, objective)?;
        if self.settings.node_limit == 0 {
            return Err(OracleError::NodeLimit { limit: 0 });
        }
        let deadline = Deadline::after(self.settings.time_limit);
        let (lower, upper) = highs::root_bounds(region);
        let outcome = highs::solve(region, &lower, &upper, objective, &self.settings, &deadline)?;
        if self.settings.log_to_console {
            debug!(
                event = "oracle_call",
                call,
                solves = 1usize,
                elapsed_ms = deadline.elapsed().as_millis() as u64,
            );
        }
        Ok(outcome)
    }
}

impl SolverOracle for HighsOracle {
    fn optimize(&self, region: &Region, objective: &Objective) -> Result<Optimum> {
        Ok(match self.solve_root("optimize", region, objective)? {
            MilpOutcome::Optimal(assignment) => Optimum::Optimal {
                value: objective.value(&assignment),
                assignment,
            },
            MilpOutcome::Infeasible => Optimum::Infeasible,
            MilpOutcome::Unbounded => Optimum::Unbounded,
        })
    }

    fn enumerate_pool(
        &self,
        region: &Region,
        objective: &Objective,
        max_count: usize,
        distinct: &[usize],
    ) -> Result<Vec<Vec<f64>>> {
        PoolSearch::new(region, objective, &self.settings, distinct)?.run(max_count)
    }

    fn check_feasible(&self, region: &Region) -> Result<bool> {
        let objective = Objective::zero(region.dimension());
        Ok(!matches!(
            self.solve_root("check_feasible", region, &objective)?,
            MilpOutcome::Infeasible
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionfit_core::{Relation, Variable};

    fn all_columns(region: &Region) -> Vec<usize> {
        (0..region.dimension()).collect()
    }

    #[test]
    fn test_check_feasible() {
        let oracle = HighsOracle::default();
        let mut region = Region::new();
        region.add_variable(Variable::integer("x", 0.0, 5.0).unwrap()).unwrap();
        assert!(oracle.check_feasible(&region).unwrap());

        region
            .add_named_constraint(None, &[("x", 2.0)], Relation::Equal, 3.0)
            .unwrap();
        assert!(!oracle.check_feasible(&region).unwrap());
    }

    #[test]
    fn test_knapsack_optimum() {
        let mut region = Region::new();
        for name in ["a", "b", "c"] {
            region.add_variable(Variable::integer(name, 0.0, 1.0).unwrap()).unwrap();
        }
        region
            .add_named_constraint(
                None,
                &[("a", 3.0), ("b", 4.0), ("c", 2.0)],
                Relation::LessEq,
                6.0,
            )
            .unwrap();
        let optimum = HighsOracle::default()
            .optimize(&region, &Objective::maximize(vec![5.0, 6.0, 3.0]))
            .unwrap();
        // b + c = 9 beats a + c = 8
        assert_eq!(
            optimum,
            Optimum::Optimal {
                value: 9.0,
                assignment: vec![0.0, 1.0, 1.0]
            }
        );
    }

    #[test]
    fn test_continuous_pool_has_one_point() {
        let oracle = HighsOracle::default();
        let mut region = Region::new();
        region.add_variable(Variable::real("x", 0.0, 1.0).unwrap()).unwrap();
        let pool = oracle
            .enumerate_pool(&region, &Objective::maximize(vec![1.0]), 10, &[0])
            .unwrap();
        assert_eq!(pool, vec![vec![1.0]]);
    }

    #[test]
    fn test_mixed_pool_distinct_in_integers() {
        let oracle = HighsOracle::default();
        let mut region = Region::new();
        region.add_variable(Variable::integer("n", 0.0, 3.0).unwrap()).unwrap();
        region.add_variable(Variable::real("r", 0.0, 10.0).unwrap()).unwrap();
        region
            .add_named_constraint(None, &[("n", 1.0), ("r", 1.0)], Relation::LessEq, 4.5)
            .unwrap();
        let columns = all_columns(&region);
        let pool = oracle
            .enumerate_pool(&region, &Objective::maximize(vec![0.0, 1.0]), 100, &columns)
            .unwrap();
        let mut ints: Vec<f64> = pool.iter().map(|p| p[0]).collect();
        ints.sort_by(f64::total_cmp);
        assert_eq!(ints, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(pool.iter().all(|p| region.is_satisfied(p, 1e-6)));
    }

    #[test]
    fn test_zero_node_limit_has_no_incumbent() {
        let oracle = HighsOracle::new(OracleSettings {
            node_limit: 0,
            ..OracleSettings::default()
        });
        let region = regionfit_test::triangle_grid();
        assert_eq!(
            oracle.optimize(&region, &Objective::zero(2)),
            Err(OracleError::NodeLimit { limit: 0 })
        );
        assert!(oracle
            .enumerate_pool(&region, &Objective::zero(2), 10, &[0, 1])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_timeout_surfaces() {
        let oracle = HighsOracle::new(OracleSettings {
            time_limit: std::time::Duration::ZERO,
            ..OracleSettings::default()
        });
        let mut region = Region::new();
        region.add_variable(Variable::integer("x", 0.0, 5.0).unwrap()).unwrap();
        region.add_variable(Variable::integer("y", 0.0, 5.0).unwrap()).unwrap();
        assert!(matches!(
            oracle.enumerate_pool(&region, &Objective::zero(2), 10, &[0, 1]),
            Err(OracleError::Timeout { .. })
        ));
    }
}
