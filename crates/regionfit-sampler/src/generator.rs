//! Labelled datasets drawn uniformly from a model's bounding box.
//!
//! Rows are drawn in batches of `n`, one coordinate per declared variable
//! (whole numbers for integer domains, a uniform real otherwise), and
//! classified by the [`FeasibilityOracle`]. The generator is how training
//! and test sets are produced for a reference model.

use rand::Rng;
use regionfit_config::GeneratorConfig;
use regionfit_core::{DomainKind, SampleSet, FEASIBILITY_TOLERANCE};
use regionfit_model::ConstraintModel;
use regionfit_oracle::SolverOracle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::feasibility::FeasibilityOracle;
use crate::rng::{RngScope, SamplerRng};

/// Rejection sampler over the declared bounding box.
///
/// # Example
///
/// ```
/// use regionfit_config::GeneratorConfig;
/// use regionfit_core::Objective;
/// use regionfit_model::ConstraintModel;
/// use regionfit_oracle::HighsOracle;
/// use regionfit_sampler::LabelledGenerator;
///
/// let mut model = ConstraintModel::new(regionfit_test::triangle_grid(), Objective::zero(2)).unwrap();
/// let mut generator = LabelledGenerator::new(HighsOracle::default(), GeneratorConfig::default(), Some(3));
///
/// let positives = generator.generate(&mut model, 4, true, false, None).unwrap();
/// assert_eq!(positives.len(), 4);
/// assert!(positives.iter().all(|row| row[0] + row[1] <= 2.0));
/// ```
#[derive(Debug)]
pub struct LabelledGenerator<O> {
    oracle: O,
    config: GeneratorConfig,
    rng: SamplerRng,
    tolerance: f64,
}

impl<O: SolverOracle> LabelledGenerator<O> {
    /// `seed` fixes the generator's long-lived stream; `None` seeds from the OS.
    pub fn new(oracle: O, config: GeneratorConfig, seed: Option<u64>) -> Self {
        Self {
            oracle,
            config,
            rng: SamplerRng::new(seed),
            tolerance: FEASIBILITY_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Up to `n` distinct rows over the model's declared columns.
    ///
    /// With `positive_only`, draws continue until `n` feasible rows are
    /// kept; otherwise every drawn row is kept. With `class_column`, a
    /// trailing column named by the config holds 1 for feasible rows and 0
    /// for the rest. Stops short, without error, once the draw budget is
    /// spent. With `seed`, the call uses a fresh seeded stream and leaves
    /// the generator's own stream untouched.
    pub fn generate(
        &mut self,
        model: &mut ConstraintModel,
        n: usize,
        positive_only: bool,
        class_column: bool,
        seed: Option<u64>,
    ) -> Result<SampleSet> {
        let Self {
            oracle,
            config,
            rng,
            tolerance,
        } = self;

        let mut columns = model.columns().to_vec();
        if class_column {
            columns.push(config.class_column.clone());
        }
        let mut out = SampleSet::new(columns);
        if n == 0 {
            return Ok(out);
        }

        let Some(domains) = lattice_box(model)? else {
            debug!(event = "generator_empty_box");
            return Ok(out);
        };

        let feasibility = FeasibilityOracle::new(&*oracle).with_tolerance(*tolerance);
        let mut scope = RngScope::new(rng, seed);
        let rng = scope.rng();
        let mut draws = 0usize;
        let mut positives = 0usize;

        while out.len() < n && draws < config.draw_budget {
            let size = n.min(config.draw_budget - draws);
            let mut batch = SampleSet::new(model.columns().to_vec());
            for _ in 0..size {
                batch.insert(draw(rng, &domains))?;
            }
            draws += size;

            let verdicts = feasibility.is_satisfied(model, &batch)?;
            for (row, feasible) in batch.iter().zip(verdicts) {
                if out.len() >= n {
                    break;
                }
                if positive_only && !feasible {
                    continue;
                }
                let mut row = row.to_vec();
                if class_column {
                    row.push(if feasible { 1.0 } else { 0.0 });
                }
                if out.insert(row)? && feasible {
                    positives += 1;
                }
            }
            debug!(event = "generator_batch", draws, kept = out.len());
        }

        if out.len() < n {
            warn!(
                event = "generator_budget_spent",
                requested = n,
                kept = out.len(),
                draw_budget = config.draw_budget,
            );
        }
        info!(
            event = "dataset_generated",
            rows = out.len(),
            positives,
            draws,
            positive_only,
        );
        Ok(out)
    }
}

/// Per-column sampling domain: integer columns hold their whole-number
/// range, real columns their interval.
#[derive(Debug, Clone, Copy)]
enum Domain {
    Integer(i64, i64),
    Real(f64, f64),
}

/// Sampling domains of the declared variables, or `None` when an integer
/// domain holds no whole number.
fn lattice_box(model: &ConstraintModel) -> Result<Option<Vec<Domain>>> {
    let mut domains = Vec::with_capacity(model.declared_dimension());
    for variable in model.declared_variables() {
        variable.require_finite()?;
        let domain = match variable.kind() {
            DomainKind::Integer => match variable.integer_range() {
                Some((low, high)) => Domain::Integer(low, high),
                None => return Ok(None),
            },
            DomainKind::Real => Domain::Real(variable.lower(), variable.upper()),
        };
        domains.push(domain);
    }
    Ok(Some(domains))
}

fn draw(rng: &mut SamplerRng, domains: &[Domain]) -> Vec<f64> {
    domains
        .iter()
        .map(|&domain| match domain {
            Domain::Integer(low, high) => rng.random_range(low..=high) as f64,
            Domain::Real(low, high) if high > low => rng.random_range(low..high),
            Domain::Real(low, _) => low,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SamplingError;
    use regionfit_core::{Objective, Region, RegionError, Variable};
    use regionfit_oracle::HighsOracle;
    use regionfit_test::lp::AUXILIARY_LP;
    use regionfit_test::{infeasible_interval, triangle_grid, unit_square};

    fn generator(seed: u64) -> LabelledGenerator<HighsOracle> {
        LabelledGenerator::new(HighsOracle::default(), GeneratorConfig::default(), Some(seed))
    }

    fn triangle() -> ConstraintModel {
        ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap()
    }

    #[test]
    fn test_positive_only_keeps_feasible_rows() {
        let mut model = triangle();
        let set = generator(1).generate(&mut model, 6, true, false, None).unwrap();
        // the triangle holds exactly six lattice points
        assert_eq!(set.len(), 6);
        assert_eq!(set.columns(), &["x".to_string(), "y".to_string()]);
        for row in set.iter() {
            assert!(row[0] + row[1] <= 2.0, "{row:?}");
            assert!(row.iter().all(|v| v.fract() == 0.0));
        }
    }

    #[test]
    fn test_class_column_labels_every_row() {
        let mut model = triangle();
        let set = generator(2).generate(&mut model, 9, false, true, None).unwrap();
        assert_eq!(set.len(), 9);
        assert_eq!(set.columns().last().map(String::as_str), Some("class"));
        let (features, labels) = set.split_column("class");
        let labels = labels.unwrap();
        for (row, label) in features.iter().zip(&labels) {
            let expected = if row[0] + row[1] <= 2.0 { 1.0 } else { 0.0 };
            assert_eq!(*label, expected, "{row:?}");
        }
        assert_eq!(labels.iter().filter(|&&l| l == 1.0).count(), 6);
    }

    #[test]
    fn test_positive_only_with_class_column_is_all_ones() {
        let mut model = triangle();
        let set = generator(3).generate(&mut model, 3, true, true, None).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|row| row[2] == 1.0));
    }

    #[test]
    fn test_budget_stops_short_without_padding() {
        let mut model = triangle();
        let config = GeneratorConfig {
            draw_budget: 500,
            ..GeneratorConfig::default()
        };
        let mut generator = LabelledGenerator::new(HighsOracle::default(), config, Some(4));
        let set = generator.generate(&mut model, 50, true, false, None).unwrap();
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn test_infeasible_model_yields_no_positives() {
        let mut model = ConstraintModel::new(infeasible_interval(), Objective::zero(1)).unwrap();
        let config = GeneratorConfig {
            draw_budget: 200,
            ..GeneratorConfig::default()
        };
        let mut generator = LabelledGenerator::new(HighsOracle::default(), config, Some(5));
        assert!(generator.generate(&mut model, 5, true, false, None).unwrap().is_empty());

        let labelled = generator.generate(&mut model, 5, false, true, None).unwrap();
        assert_eq!(labelled.len(), 5);
        assert!(labelled.iter().all(|row| row[1] == 0.0));
    }

    #[test]
    fn test_real_columns_stay_in_bounds() {
        let mut model = ConstraintModel::new(unit_square(), Objective::zero(2)).unwrap();
        let set = generator(6).generate(&mut model, 20, false, false, None).unwrap();
        assert_eq!(set.len(), 20);
        assert!(set.iter().flatten().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_auxiliary_variables_are_completed_by_the_oracle() {
        let declared = vec!["x".to_string(), "y".to_string()];
        let mut model = ConstraintModel::from_lp_str(AUXILIARY_LP, Some(&declared)).unwrap();
        let before = model.region().clone();
        let labelled = generator(7).generate(&mut model, 10, false, true, None).unwrap();
        let positives = generator(7).generate(&mut model, 3, true, false, None).unwrap();
        assert_eq!(model.region(), &before);
        assert_eq!(labelled.width(), 3);

        let verdicts = FeasibilityOracle::new(HighsOracle::default())
            .is_satisfied(&mut model, &positives)
            .unwrap();
        assert!(verdicts.into_iter().all(|v| v));
    }

    #[test]
    fn test_seed_override_is_reproducible() {
        let mut model = triangle();
        let mut generator = generator(8);
        let first = generator.generate(&mut model, 5, false, true, Some(11)).unwrap();
        let second = generator.generate(&mut model, 5, false, true, Some(11)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unbounded_domain_is_rejected() {
        let mut region = Region::new();
        region
            .add_variable(Variable::real("x", 0.0, f64::INFINITY).unwrap())
            .unwrap();
        let mut model = ConstraintModel::new(region, Objective::zero(1)).unwrap();
        assert!(matches!(
            generator(9).generate(&mut model, 1, false, false, None),
            Err(SamplingError::Region(RegionError::UnboundedVariable(ref name))) if name == "x"
        ));
    }
}
