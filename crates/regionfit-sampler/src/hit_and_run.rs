//! Hit-and-run Markov chain over a model's feasible region.
//!
//! The chain lives in the full variable space (auxiliary variables
//! included) and reports points projected onto the declared columns.
//!
//! ```text
//! Seeding ──► Stepping ──► Done
//!    ▲           │
//!    └─ restart ◄┘ after too many consecutive failures
//! ```

use rand::Rng;
use regionfit_config::HitAndRunConfig;
use regionfit_core::{LinearConstraint, Objective, Relation, SampleSet, Variable, FEASIBILITY_TOLERANCE};
use regionfit_model::{ConstraintModel, DomainCoercion};
use regionfit_oracle::{Optimum, SolverOracle};
use tracing::{debug, info, trace};

use crate::error::Result;
use crate::rng::{RngScope, SamplerRng};

const LAMBDA: &str = "__hit_and_run_lambda";

/// Approximately uniform sampler for regions with continuous variables.
///
/// Each step draws a random direction, asks the oracle for the feasible
/// segment through the current point along it, and moves to a uniform point
/// on that segment. Models with integer variables have every move snapped
/// back onto the lattice by an L1 projection.
///
/// Sequential and not thread-safe: each call owns its chain.
#[derive(Debug)]
pub struct HitAndRunSampler<O> {
    oracle: O,
    config: HitAndRunConfig,
    rng: SamplerRng,
    tolerance: f64,
}

impl<O: SolverOracle> HitAndRunSampler<O> {
    /// `seed` fixes the sampler's long-lived stream; `None` seeds from the OS.
    pub fn new(oracle: O, config: HitAndRunConfig, seed: Option<u64>) -> Self {
        Self {
            oracle,
            config,
            rng: SamplerRng::new(seed),
            tolerance: FEASIBILITY_TOLERANCE,
        }
    }

    pub fn config(&self) -> &HitAndRunConfig {
        &self.config
    }

    /// Samples with the configured budget.
    pub fn sample_default(
        &mut self,
        model: &mut ConstraintModel,
        n: usize,
        seed: Option<u64>,
    ) -> Result<SampleSet> {
        let budget = self.config.budget;
        self.sample(model, n, budget, seed)
    }

    /// Runs the chain until `n` distinct points are collected or `budget`
    /// line searches are spent.
    ///
    /// With `seed`, this call draws from a fresh seeded stream and the
    /// sampler's own stream is left exactly where it was. An infeasible
    /// model yields an empty set. The result is never padded.
    pub fn sample(
        &mut self,
        model: &mut ConstraintModel,
        n: usize,
        budget: usize,
        seed: Option<u64>,
    ) -> Result<SampleSet> {
        let Self {
            oracle,
            config,
            rng,
            tolerance,
        } = self;
        let mut rng_scope = RngScope::new(rng, seed);
        let mut chain = Chain {
            oracle: &*oracle,
            config: &*config,
            tolerance: *tolerance,
            rng: rng_scope.rng(),
        };
        chain.run(model, n, budget)
    }
}

enum ChainState {
    Seeding,
    Stepping { current: Vec<f64>, failures: usize },
    Done,
}

struct Chain<'a, O> {
    oracle: &'a O,
    config: &'a HitAndRunConfig,
    tolerance: f64,
    rng: &'a mut SamplerRng,
}

impl<O: SolverOracle> Chain<'_, O> {
    fn run(&mut self, model: &mut ConstraintModel, n: usize, budget: usize) -> Result<SampleSet> {
        let mut samples = SampleSet::new(model.columns().to_vec());
        let max_failures = self.config.max_consecutive_failures.max(1);
        let mut remaining = budget;
        let mut restarts = 0usize;
        let mut state = if n == 0 { ChainState::Done } else { ChainState::Seeding };

        loop {
            state = match state {
                ChainState::Seeding => match self.seed_point(model)? {
                    Some(current) => ChainState::Stepping {
                        current,
                        failures: 0,
                    },
                    None => ChainState::Done,
                },
                ChainState::Stepping { current, failures } => {
                    if samples.len() >= n || remaining == 0 {
                        ChainState::Done
                    } else if failures >= max_failures {
                        restarts += 1;
                        debug!(event = "chain_restart", restarts, collected = samples.len());
                        ChainState::Seeding
                    } else {
                        remaining -= 1;
                        let accepted = match self.step(model, &current)? {
                            Some(next) if !samples.contains(&model.project(&next)) => Some(next),
                            _ => None,
                        };
                        match accepted {
                            Some(next) => {
                                samples.insert(model.project(&next))?;
                                trace!(event = "step_accepted", collected = samples.len());
                                ChainState::Stepping {
                                    current: next,
                                    failures: 0,
                                }
                            }
                            None => ChainState::Stepping {
                                current,
                                failures: failures + 1,
                            },
                        }
                    }
                }
                ChainState::Done => break,
            };
        }

        info!(
            event = "sampling_complete",
            sampler = "hit_and_run",
            requested = n,
            returned = samples.len(),
            budget_used = budget - remaining,
            restarts,
        );
        Ok(samples)
    }

    /// A feasible starting point, or `None` if the model is infeasible.
    fn seed_point(&mut self, model: &mut ConstraintModel) -> Result<Option<Vec<f64>>> {
        let dimension = model.region().dimension();
        let coefficients = (0..dimension)
            .map(|_| self.rng.random_range(-1.0..=1.0))
            .collect();

        let optimum = {
            let mut scope = model.scope();
            scope.coerce_domains(DomainCoercion::AllContinuous);
            match self.oracle.optimize(scope.region(), &Objective::maximize(coefficients))? {
                Optimum::Unbounded => self
                    .oracle
                    .optimize(scope.region(), &Objective::zero(dimension))?,
                other => other,
            }
        };
        let Optimum::Optimal { mut assignment, .. } = optimum else {
            return Ok(None);
        };

        for (value, variable) in assignment.iter_mut().zip(model.region().variables()) {
            if variable.is_integer() {
                *value = value.round() + 0.0;
            }
        }
        if model.region().is_satisfied(&assignment, self.tolerance) {
            Ok(Some(assignment))
        } else {
            self.project(model, &assignment)
        }
    }

    /// One line search from `current`. `None` marks a failed step.
    fn step(&mut self, model: &mut ConstraintModel, current: &[f64]) -> Result<Option<Vec<f64>>> {
        let dimension = current.len();
        let direction: Vec<f64> = (0..dimension)
            .map(|_| self.rng.random_range(-1.0..=1.0))
            .collect();
        let sentinel = self.config.unbounded_sentinel;

        let (low, high) = {
            let mut scope = model.scope();
            scope.coerce_domains(DomainCoercion::AllContinuous);
            let lambda = scope.add_variable(Variable::real(LAMBDA, -sentinel, sentinel)?)?;
            for (i, (&x, &d)) in current.iter().zip(&direction).enumerate() {
                scope.add_constraint(LinearConstraint::new(
                    vec![(i, 1.0), (lambda, -d)],
                    Relation::Equal,
                    x,
                ))?;
            }
            let mut unit = vec![0.0; dimension + 1];
            unit[lambda] = 1.0;

            let high = match self
                .oracle
                .optimize(scope.region(), &Objective::maximize(unit.clone()))?
            {
                Optimum::Optimal { value, .. } => value,
                Optimum::Unbounded => sentinel,
                Optimum::Infeasible => return Ok(None),
            };
            let low = match self.oracle.optimize(scope.region(), &Objective::minimize(unit))? {
                Optimum::Optimal { value, .. } => value,
                Optimum::Unbounded => -sentinel,
                Optimum::Infeasible => return Ok(None),
            };
            (low, high)
        };
        if high - low <= self.tolerance {
            return Ok(None);
        }

        let lambda = self.rng.random_range(low..=high);
        let candidate: Vec<f64> = current
            .iter()
            .zip(&direction)
            .zip(model.region().variables())
            .map(|((&x, &d), variable)| variable.clamp(x + d * lambda))
            .collect();

        if model.region().has_integer_variables() {
            self.project(model, &candidate)
        } else if model.region().is_satisfied(&candidate, self.tolerance) {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }

    /// Nearest feasible point to `target` in L1 distance over the declared
    /// coordinates, honoring the model's own domains.
    fn project(&self, model: &mut ConstraintModel, target: &[f64]) -> Result<Option<Vec<f64>>> {
        let declared = model.declared().to_vec();
        let projected = {
            let mut scope = model.scope();
            let base = scope.region().dimension();
            for (k, &i) in declared.iter().enumerate() {
                let t = scope.add_variable(Variable::real(
                    format!("__l1_distance_{k}"),
                    0.0,
                    f64::INFINITY,
                )?)?;
                // t >= x - c and t >= c - x
                scope.add_constraint(LinearConstraint::new(
                    vec![(t, 1.0), (i, -1.0)],
                    Relation::GreaterEq,
                    -target[i],
                ))?;
                scope.add_constraint(LinearConstraint::new(
                    vec![(t, 1.0), (i, 1.0)],
                    Relation::GreaterEq,
                    target[i],
                ))?;
            }
            let mut coefficients = vec![0.0; scope.region().dimension()];
            coefficients[base..].iter_mut().for_each(|c| *c = 1.0);
            match self
                .oracle
                .optimize(scope.region(), &Objective::minimize(coefficients))?
            {
                Optimum::Optimal { assignment, .. } => Some(assignment[..base].to_vec()),
                _ => None,
            }
        };
        Ok(projected.filter(|point| model.region().is_satisfied(point, self.tolerance)))
    }
}
