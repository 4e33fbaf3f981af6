//! Relative volume of a model's feasible region inside its bounding box.
//!
//! Per-coordinate measures: an integer coordinate counts its whole numbers,
//! a real coordinate measures its length, and a zero-width real coordinate
//! measures 1.

use std::fmt;

use rand::Rng;
use regionfit_config::{VolumeConfig, VolumeStrategy};
use regionfit_core::{DomainKind, Objective, Relation, SampleSet, Variable, FEASIBILITY_TOLERANCE};
use regionfit_model::{ConstraintModel, DomainCoercion};
use regionfit_oracle::{Optimum, SolverOracle};
use tracing::{debug, info};

use crate::error::Result;
use crate::feasibility::FeasibilityOracle;
use crate::rng::SamplerRng;

/// How a [`VolumeEstimate`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeMethod {
    /// No declared variables.
    Trivial,
    BoxMonteCarlo,
    Hypercube,
    /// Enumeration over the integer lattice.
    Precise,
}

impl fmt::Display for VolumeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolumeMethod::Trivial => "trivial",
            VolumeMethod::BoxMonteCarlo => "box_monte_carlo",
            VolumeMethod::Hypercube => "hypercube",
            VolumeMethod::Precise => "precise",
        };
        f.write_str(name)
    }
}

/// Fraction of the bounding box covered by the feasible region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeEstimate {
    /// In `[0, 1]`.
    pub probability: f64,
    pub method: VolumeMethod,
}

/// Estimates `feasible volume / bounding-box volume` over the declared
/// variables.
#[derive(Debug)]
pub struct VolumeEstimator<O> {
    oracle: O,
    config: VolumeConfig,
    rng: SamplerRng,
    tolerance: f64,
}

impl<O: SolverOracle> VolumeEstimator<O> {
    pub fn new(oracle: O, config: VolumeConfig, seed: Option<u64>) -> Self {
        Self {
            oracle,
            config,
            rng: SamplerRng::new(seed),
            tolerance: FEASIBILITY_TOLERANCE,
        }
    }

    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    /// Product of the declared variables' measures.
    pub fn bounding_box_volume(model: &ConstraintModel) -> f64 {
        model.declared_variables().map(Variable::measure).product()
    }

    /// Runs the configured heuristic, then recomputes by enumeration when
    /// the heuristic falls below the reporting floor.
    pub fn estimate(&mut self, model: &mut ConstraintModel) -> Result<VolumeEstimate> {
        if model.declared_dimension() == 0 {
            return Ok(VolumeEstimate {
                probability: 1.0,
                method: VolumeMethod::Trivial,
            });
        }

        let mut estimate = match self.config.strategy {
            VolumeStrategy::BoxMonteCarlo => VolumeEstimate {
                probability: self.box_monte_carlo(model, None)?,
                method: VolumeMethod::BoxMonteCarlo,
            },
            VolumeStrategy::Hypercube => VolumeEstimate {
                probability: self.hypercube(model)?,
                method: VolumeMethod::Hypercube,
            },
        };
        if estimate.probability < self.config.reporting_floor {
            debug!(
                event = "volume_fallback",
                heuristic = %estimate.method,
                probability = estimate.probability,
            );
            estimate = VolumeEstimate {
                probability: self.precise(model)?,
                method: VolumeMethod::Precise,
            };
        }

        info!(
            event = "volume_estimated",
            probability = estimate.probability,
            method = %estimate.method,
        );
        Ok(estimate)
    }

    /// Uniform samples in the box spanned by four extreme points.
    ///
    /// The extreme points maximize and minimize `objective` (all ones over
    /// the declared variables when `None`) and an alternating-sign
    /// objective.
    pub fn box_monte_carlo(
        &mut self,
        model: &mut ConstraintModel,
        objective: Option<&Objective>,
    ) -> Result<f64> {
        let declared = model.declared().to_vec();
        if declared.is_empty() {
            return Ok(1.0);
        }
        let full = model.region().dimension();
        let bounding = Self::bounding_box_volume(model);
        if bounding == 0.0 {
            return Ok(0.0);
        }

        let primary = match objective {
            Some(objective) => objective.resized(full).coefficients().to_vec(),
            None => declared_weights(full, &declared, |_| 1.0),
        };
        let alternating =
            declared_weights(full, &declared, |k| if k % 2 == 0 { 1.0 } else { -1.0 });

        let mut low = vec![f64::INFINITY; declared.len()];
        let mut high = vec![f64::NEG_INFINITY; declared.len()];
        for coefficients in [primary, alternating] {
            for objective in [
                Objective::maximize(coefficients.clone()),
                Objective::minimize(coefficients),
            ] {
                match self.oracle.optimize(model.region(), &objective)? {
                    Optimum::Optimal { assignment, .. } => {
                        for (k, &idx) in declared.iter().enumerate() {
                            low[k] = low[k].min(assignment[idx]);
                            high[k] = high[k].max(assignment[idx]);
                        }
                    }
                    Optimum::Infeasible => return Ok(0.0),
                    Optimum::Unbounded => {}
                }
            }
        }

        let kinds: Vec<DomainKind> = model.declared_variables().map(Variable::kind).collect();
        for (k, variable) in model.declared_variables().enumerate() {
            if low[k] > high[k] {
                low[k] = variable.lower();
                high[k] = variable.upper();
            }
            if kinds[k].is_integer() {
                low[k] = (low[k] - self.tolerance).ceil();
                high[k] = (high[k] + self.tolerance).floor();
            }
        }
        let tight: f64 = kinds
            .iter()
            .zip(low.iter().zip(&high))
            .map(|(&kind, (&l, &u))| Variable::measure_of(kind, l, u))
            .product();

        let mut points = SampleSet::new(model.columns().to_vec());
        for _ in 0..self.config.box_samples {
            let point = kinds
                .iter()
                .zip(low.iter().zip(&high))
                .map(|(&kind, (&l, &u))| match kind {
                    DomainKind::Integer => self.rng.random_range(l as i64..=u as i64) as f64,
                    DomainKind::Real if u > l => self.rng.random_range(l..=u),
                    DomainKind::Real => l,
                })
                .collect();
            points.insert(point)?;
        }
        if points.is_empty() {
            return Ok(0.0);
        }

        let verdicts = FeasibilityOracle::new(&self.oracle)
            .with_tolerance(self.tolerance)
            .is_satisfied(model, &points)?;
        let fraction = verdicts.iter().filter(|&&v| v).count() as f64 / verdicts.len() as f64;
        let probability = (fraction * tight / bounding).clamp(0.0, 1.0);
        debug!(
            event = "box_monte_carlo",
            samples = points.len(),
            fraction,
            probability,
        );
        Ok(probability)
    }

    /// Largest hypercubes anchored at the two optimal vertices of the
    /// model's objective (all ones when the objective is zero), averaged.
    ///
    /// Each cube lies inside the region, so the estimate never exceeds the
    /// true relative volume of a convex region.
    pub fn hypercube(&self, model: &ConstraintModel) -> Result<f64> {
        let declared = model.declared().to_vec();
        if declared.is_empty() {
            return Ok(1.0);
        }
        let full = model.region().dimension();
        let bounding = Self::bounding_box_volume(model);
        if bounding == 0.0 {
            return Ok(0.0);
        }

        let own = model.objective().coefficients();
        let coefficients = if declared.iter().any(|&idx| own[idx] != 0.0) {
            own.to_vec()
        } else {
            declared_weights(full, &declared, |_| 1.0)
        };

        let mut total = 0.0;
        for objective in [
            Objective::maximize(coefficients.clone()),
            Objective::minimize(coefficients),
        ] {
            let vertex = match self.oracle.optimize(model.region(), &objective)? {
                Optimum::Optimal { assignment, .. } => assignment,
                _ => return Ok(0.0),
            };
            let edge = self.anchored_edge(model, &vertex);
            let volume: f64 = model
                .declared_variables()
                .filter(|v| v.upper() > v.lower())
                .map(|v| {
                    if v.is_integer() {
                        (edge + self.tolerance).floor() + 1.0
                    } else {
                        edge
                    }
                })
                .product();
            total += volume;
        }
        let probability = (total / 2.0 / bounding).clamp(0.0, 1.0);
        debug!(event = "hypercube", probability);
        Ok(probability)
    }

    /// Longest edge `e` of an axis-aligned hypercube anchored at `vertex`
    /// whose every corner lies in the continuous relaxation.
    ///
    /// The cube spans `[v_i, v_i + s_i·e]` on each declared coordinate with
    /// room to move, `s_i` pointing towards the side of the domain with more
    /// room; all other coordinates stay at the vertex. The worst corner of a
    /// row `a·x <= b` adds `e·Σ max(0, s_i·a_i)` to its activity, so each row
    /// caps `e` on its own and the edge LP reduces to a minimum over rows.
    /// An equality row touching a moving coordinate forces `e = 0`.
    fn anchored_edge(&self, model: &ConstraintModel, vertex: &[f64]) -> f64 {
        let region = model.region();
        let mut sides = vec![0.0; region.dimension()];
        let mut edge = f64::INFINITY;
        for &idx in model.declared() {
            let variable = region.variable(idx);
            let (lower, upper) = (variable.lower(), variable.upper());
            if upper <= lower {
                continue;
            }
            let v = vertex[idx];
            let (side, room) = if v - lower <= upper - v {
                (1.0, upper - v)
            } else {
                (-1.0, v - lower)
            };
            sides[idx] = side;
            edge = edge.min(room);
        }
        if !edge.is_finite() {
            return 0.0;
        }

        for row in region.constraints() {
            let slack = row.rhs() - row.activity(vertex);
            let (rise, fall) = row.terms().iter().fold((0.0, 0.0), |(rise, fall), &(j, a)| {
                let step = sides[j] * a;
                (rise + step.max(0.0), fall + (-step).max(0.0))
            });
            let cap = match row.relation() {
                Relation::LessEq => per_unit(slack, rise),
                Relation::GreaterEq => per_unit(-slack, fall),
                Relation::Equal if rise + fall > 0.0 => 0.0,
                Relation::Equal => f64::INFINITY,
            };
            edge = edge.min(cap);
        }
        edge.max(0.0)
    }

    /// Exact lattice count: every variable is treated as integer and the
    /// solution pool (capped, distinct on the declared columns) is divided
    /// by the declared lattice size.
    pub fn precise(&self, model: &mut ConstraintModel) -> Result<f64> {
        if model.declared_dimension() == 0 {
            return Ok(1.0);
        }
        let lattice: f64 = model
            .declared_variables()
            .map(|v| Variable::measure_of(DomainKind::Integer, v.lower(), v.upper()))
            .product();
        if lattice == 0.0 {
            return Ok(0.0);
        }

        let full = model.region().dimension();
        let declared = model.declared().to_vec();
        let cap = self.config.pool_cap;
        let pool = {
            let mut scope = model.scope();
            scope.coerce_domains(DomainCoercion::AllInteger);
            self.oracle
                .enumerate_pool(scope.region(), &Objective::zero(full), cap, &declared)?
        };
        if pool.len() >= cap {
            debug!(event = "volume_pool_capped", pool_cap = cap);
        }

        let mut points = SampleSet::new(model.columns().to_vec());
        for assignment in pool {
            let rounded: Vec<f64> = assignment.iter().map(|v| v.round() + 0.0).collect();
            points.insert(model.project(&rounded))?;
        }
        Ok((points.len() as f64 / lattice).min(1.0))
    }
}

/// Largest `e` with `e * rate <= slack`; a vertex already past the row
/// (by rounding) admits no edge.
fn per_unit(slack: f64, rate: f64) -> f64 {
    if rate > 0.0 {
        slack.max(0.0) / rate
    } else {
        f64::INFINITY
    }
}

/// Dense weights over all variables, `weight(k)` on the k-th declared one.
fn declared_weights(full: usize, declared: &[usize], weight: impl Fn(usize) -> f64) -> Vec<f64> {
    let mut coefficients = vec![0.0; full];
    for (k, &idx) in declared.iter().enumerate() {
        coefficients[idx] = weight(k);
    }
    coefficients
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionfit_core::Region;
    use regionfit_oracle::HighsOracle;
    use regionfit_test::{infeasible_interval, triangle_grid, unit_square};

    fn estimator(strategy: VolumeStrategy) -> VolumeEstimator<HighsOracle> {
        let config = VolumeConfig {
            strategy,
            ..VolumeConfig::default()
        };
        VolumeEstimator::new(HighsOracle::default(), config, Some(17))
    }

    #[test]
    fn test_precise_triangle() {
        let mut model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
        let p = estimator(VolumeStrategy::BoxMonteCarlo).precise(&mut model).unwrap();
        assert!((p - 6.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_box_monte_carlo_triangle_is_exact_on_small_lattice() {
        let mut model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
        // 2000 draws cover all nine lattice points of the tight box
        let p = estimator(VolumeStrategy::BoxMonteCarlo)
            .box_monte_carlo(&mut model, None)
            .unwrap();
        assert!((p - 6.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_unit_square_is_full() {
        let mut model = ConstraintModel::new(unit_square(), Objective::zero(2)).unwrap();
        let estimate = estimator(VolumeStrategy::BoxMonteCarlo).estimate(&mut model).unwrap();
        assert_eq!(estimate.method, VolumeMethod::BoxMonteCarlo);
        assert!((estimate.probability - 1.0).abs() < 1e-12);

        let p = estimator(VolumeStrategy::Hypercube).hypercube(&model).unwrap();
        assert!((p - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hypercube_triangle() {
        let model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
        let before = model.region().clone();
        let p = estimator(VolumeStrategy::Hypercube).hypercube(&model).unwrap();
        // top vertex is pinned by the diagonal (1 point); the origin holds
        // a 2x2 block
        assert!((p - 5.0 / 18.0).abs() < 1e-12, "{p}");
        assert_eq!(model.region(), &before);
    }

    fn diagonal(integer: bool) -> ConstraintModel {
        let mut region = Region::new();
        for name in ["x", "y"] {
            let variable = if integer {
                Variable::integer(name, 0.0, 10.0)
            } else {
                Variable::real(name, 0.0, 10.0)
            };
            region.add_variable(variable.unwrap()).unwrap();
        }
        region
            .add_named_constraint(None, &[("x", 1.0), ("y", -1.0)], Relation::Equal, 0.0)
            .unwrap();
        ConstraintModel::new(region, Objective::zero(2)).unwrap()
    }

    #[test]
    fn test_hypercube_on_an_equality_has_no_volume() {
        let p = estimator(VolumeStrategy::Hypercube)
            .hypercube(&diagonal(false))
            .unwrap();
        assert_eq!(p, 0.0);
    }

    #[test]
    fn test_hypercube_on_an_integer_equality_counts_the_vertex_only() {
        let model = diagonal(true);
        let estimator = estimator(VolumeStrategy::Hypercube);
        let p = estimator.hypercube(&model).unwrap();
        assert!((p - 1.0 / 121.0).abs() < 1e-12, "{p}");

        let mut model = model;
        let exact = estimator.precise(&mut model).unwrap();
        assert!(p <= exact, "{p} > {exact}");
    }

    #[test]
    fn test_hypercube_stays_below_precise_on_the_triangle() {
        let mut model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
        let estimator = estimator(VolumeStrategy::Hypercube);
        let p = estimator.hypercube(&model).unwrap();
        assert!(p <= estimator.precise(&mut model).unwrap());
    }

    #[test]
    fn test_infeasible_estimates_zero() {
        for strategy in [VolumeStrategy::BoxMonteCarlo, VolumeStrategy::Hypercube] {
            let mut model =
                ConstraintModel::new(infeasible_interval(), Objective::zero(1)).unwrap();
            let estimate = estimator(strategy).estimate(&mut model).unwrap();
            assert_eq!(estimate.probability, 0.0);
            assert_eq!(estimate.method, VolumeMethod::Precise);
        }
    }

    #[test]
    fn test_no_declared_variables() {
        let mut model =
            ConstraintModel::with_declared(triangle_grid(), Objective::zero(2), &[] as &[&str])
                .unwrap();
        let estimate = estimator(VolumeStrategy::BoxMonteCarlo).estimate(&mut model).unwrap();
        assert_eq!(
            estimate,
            VolumeEstimate {
                probability: 1.0,
                method: VolumeMethod::Trivial
            }
        );
    }
}
