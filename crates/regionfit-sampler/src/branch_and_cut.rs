//! Sampling by enumerating the solver's solution pool.

use regionfit_config::BranchAndCutConfig;
use regionfit_core::SampleSet;
use regionfit_model::{ConstraintModel, DomainCoercion};
use regionfit_oracle::SolverOracle;
use tracing::{debug, info};

use crate::error::Result;

/// Draws up to `n` distinct feasible points from the solver's solution pool.
///
/// Points come out in pool order (best objective first), so the sample is
/// biased towards the model's objective. The pool is made distinct on the
/// declared columns, so auxiliary variables never use up pool slots.
#[derive(Debug, Clone)]
pub struct BranchAndCutSampler<O> {
    oracle: O,
    config: BranchAndCutConfig,
}

impl<O: SolverOracle> BranchAndCutSampler<O> {
    pub fn new(oracle: O, config: BranchAndCutConfig) -> Self {
        Self { oracle, config }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Samples with the configured `relax_to_integer` setting.
    pub fn sample_default(&self, model: &mut ConstraintModel, n: usize) -> Result<SampleSet> {
        self.sample(model, n, self.config.relax_to_integer)
    }

    /// Returns at most `n` distinct points over the declared columns.
    ///
    /// With `relax_to_integer`, continuous variables are treated as integer
    /// while pooling. Domains are restored before returning, whether or not
    /// the oracle call succeeds. An infeasible model yields an empty set.
    pub fn sample(
        &self,
        model: &mut ConstraintModel,
        n: usize,
        relax_to_integer: bool,
    ) -> Result<SampleSet> {
        let mut samples = SampleSet::new(model.columns().to_vec());
        if n == 0 {
            return Ok(samples);
        }

        let objective = model.objective().clone();
        let declared = model.declared().to_vec();
        let pool = {
            let mut scope = model.scope();
            if relax_to_integer {
                scope.coerce_domains(DomainCoercion::AllInteger);
            }
            self.oracle
                .enumerate_pool(scope.region(), &objective, n, &declared)?
        };

        let integer: Vec<bool> = model.region().variables().iter().map(|v| v.is_integer()).collect();
        for mut assignment in pool {
            for (value, &is_integer) in assignment.iter_mut().zip(&integer) {
                if is_integer || relax_to_integer {
                    *value = value.round() + 0.0;
                }
            }
            samples.insert(model.project(&assignment))?;
            if samples.len() >= n {
                break;
            }
        }

        if samples.len() < n {
            debug!(
                event = "pool_exhausted",
                requested = n,
                found = samples.len(),
            );
        }
        info!(
            event = "sampling_complete",
            sampler = "branch_and_cut",
            requested = n,
            returned = samples.len(),
        );
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionfit_core::{Objective, Region, Relation, Variable};
    use regionfit_oracle::HighsOracle;
    use regionfit_test::{infeasible_interval, triangle_grid};

    fn sampler() -> BranchAndCutSampler<HighsOracle> {
        BranchAndCutSampler::new(HighsOracle::default(), BranchAndCutConfig::default())
    }

    #[test]
    fn test_triangle_yields_all_six() {
        let mut model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
        let samples = sampler().sample(&mut model, 10, false).unwrap();
        assert_eq!(samples.len(), 6);
        assert!(samples.iter().all(|p| model.region().is_satisfied(p, 1e-6)));
    }

    #[test]
    fn test_respects_n() {
        let mut model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
        assert_eq!(sampler().sample(&mut model, 4, false).unwrap().len(), 4);
        assert!(sampler().sample(&mut model, 0, false).unwrap().is_empty());
    }

    #[test]
    fn test_infeasible_is_empty() {
        let mut model = ConstraintModel::new(infeasible_interval(), Objective::zero(1)).unwrap();
        assert!(sampler().sample(&mut model, 10, false).unwrap().is_empty());
    }

    #[test]
    fn test_auxiliary_integers_do_not_use_up_the_pool() {
        let mut region = Region::new();
        region.add_variable(Variable::integer("x", 0.0, 2.0).unwrap()).unwrap();
        region.add_variable(Variable::integer("t", 0.0, 1.0).unwrap()).unwrap();
        region
            .add_named_constraint(None, &[("x", 1.0), ("t", 1.0)], Relation::LessEq, 3.0)
            .unwrap();
        let mut model = ConstraintModel::with_declared(region, Objective::zero(2), &["x"]).unwrap();

        let samples = sampler().sample(&mut model, 3, false).unwrap();
        assert_eq!(samples.columns(), ["x".to_string()]);
        let mut xs: Vec<f64> = samples.iter().map(|p| p[0]).collect();
        xs.sort_by(f64::total_cmp);
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_relaxation_restored() {
        let mut model =
            ConstraintModel::new(regionfit_test::unit_square(), Objective::zero(2)).unwrap();
        let before = model.region().clone();
        let samples = sampler().sample(&mut model, 10, true).unwrap();
        // the four corners of the unit square
        assert_eq!(samples.len(), 4);
        assert_eq!(model.region(), &before);
    }
}
