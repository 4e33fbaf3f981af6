//! End-to-end sampling scenarios over the shared fixture regions.

use regionfit_config::{BranchAndCutConfig, HitAndRunConfig, VolumeConfig, VolumeStrategy};
use regionfit_core::{Objective, SampleSet};
use regionfit_model::ConstraintModel;
use regionfit_oracle::HighsOracle;
use regionfit_sampler::{
    BranchAndCutSampler, FeasibilityOracle, HitAndRunSampler, VolumeEstimator, VolumeMethod,
};
use regionfit_test::data::STAIRCASE_MIXED_CSV;
use regionfit_test::regions::staircase;
use regionfit_test::{infeasible_interval, triangle_grid, unit_square};

fn model(region: regionfit_core::Region) -> ConstraintModel {
    let dimension = region.dimension();
    ConstraintModel::new(region, Objective::zero(dimension)).unwrap()
}

#[test]
fn branch_and_cut_enumerates_triangle() {
    let mut model = model(triangle_grid());
    let sampler = BranchAndCutSampler::new(HighsOracle::default(), BranchAndCutConfig::default());
    let samples = sampler.sample(&mut model, 10, false).unwrap();
    assert_eq!(samples.len(), 6);
    assert_eq!(samples.columns(), &["x".to_string(), "y".to_string()]);
}

#[test]
fn hit_and_run_fills_unit_square() {
    let mut model = model(unit_square());
    let mut sampler =
        HitAndRunSampler::new(HighsOracle::default(), HitAndRunConfig::default(), None);
    let samples = sampler.sample(&mut model, 50, 5000, Some(2024)).unwrap();
    assert_eq!(samples.len(), 50);
    for point in samples.iter() {
        assert!(point.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn infeasible_region_everywhere_empty() {
    let mut model = model(infeasible_interval());
    let bc = BranchAndCutSampler::new(HighsOracle::default(), BranchAndCutConfig::default());
    assert!(bc.sample(&mut model, 10, false).unwrap().is_empty());

    let mut hr = HitAndRunSampler::new(HighsOracle::default(), HitAndRunConfig::default(), None);
    assert!(hr.sample(&mut model, 10, 100, Some(1)).unwrap().is_empty());

    let mut volume = VolumeEstimator::new(HighsOracle::default(), VolumeConfig::default(), Some(1));
    assert_eq!(volume.estimate(&mut model).unwrap().probability, 0.0);
}

#[test]
fn feasibility_counts_reference_rows() {
    let mut model = model(staircase(3.0));
    let batch = SampleSet::from_csv_str(STAIRCASE_MIXED_CSV).unwrap();
    let verdicts = FeasibilityOracle::new(HighsOracle::default())
        .is_satisfied(&mut model, &batch)
        .unwrap();
    assert_eq!(verdicts.len(), 10);
    assert_eq!(verdicts.iter().filter(|&&v| v).count(), 7);
}

#[test]
fn seeded_hit_and_run_is_reproducible() {
    let mut model = model(unit_square());
    let mut first = HitAndRunSampler::new(HighsOracle::default(), HitAndRunConfig::default(), None);
    let mut second = HitAndRunSampler::new(HighsOracle::default(), HitAndRunConfig::default(), None);

    let a = first.sample(&mut model, 20, 1000, Some(42)).unwrap();
    let b = second.sample(&mut model, 20, 1000, Some(42)).unwrap();
    let c = second.sample(&mut model, 20, 1000, Some(43)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn precise_volume_grows_with_region() {
    let estimator = VolumeEstimator::new(HighsOracle::default(), VolumeConfig::default(), Some(0));
    let mut previous = 0.0;
    for k in 0..=4 {
        let mut model = model(staircase(k as f64));
        let p = estimator.precise(&mut model).unwrap();
        let expected = ((k + 1) * (k + 2)) as f64 / 2.0 / 100.0;
        assert!((p - expected).abs() < 1e-12, "k = {k}: {p}");
        assert!(p > previous);
        previous = p;
    }
}

#[test]
fn tiny_region_falls_back_to_enumeration() {
    // one feasible point out of 10^4
    let mut region = regionfit_test::regions::integer_box(&["a", "b", "c", "d"], 0.0, 9.0);
    region
        .add_named_constraint(
            None,
            &[("a", 1.0), ("b", 1.0), ("c", 1.0), ("d", 1.0)],
            regionfit_core::Relation::LessEq,
            0.0,
        )
        .unwrap();
    let mut model = model(region);
    let config = VolumeConfig {
        strategy: VolumeStrategy::Hypercube,
        ..VolumeConfig::default()
    };
    let estimate = VolumeEstimator::new(HighsOracle::default(), config, Some(0))
        .estimate(&mut model)
        .unwrap();
    assert_eq!(estimate.method, VolumeMethod::Precise);
    assert!((estimate.probability - 1e-4).abs() < 1e-15);
}

#[test]
fn auxiliary_integers_leave_declared_points_available() {
    let declared = vec!["x".to_string()];
    let mut model = ConstraintModel::from_lp_str(
        regionfit_test::lp::AUXILIARY_INTEGER_LP,
        Some(declared.as_slice()),
    )
    .unwrap();
    assert!(model.has_auxiliary_variables());

    let sampler = BranchAndCutSampler::new(HighsOracle::default(), BranchAndCutConfig::default());
    let samples = sampler.sample(&mut model, 3, false).unwrap();
    assert_eq!(samples.len(), 3);

    let mut estimator = VolumeEstimator::new(HighsOracle::default(), VolumeConfig::default(), Some(2));
    assert_eq!(estimator.precise(&mut model).unwrap(), 1.0);
}
