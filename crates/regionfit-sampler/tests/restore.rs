//! Models come back unchanged from every call, including failed ones.

use regionfit_config::{BranchAndCutConfig, HitAndRunConfig, VolumeConfig, VolumeStrategy};
use regionfit_core::{Objective, SampleSet};
use regionfit_model::ConstraintModel;
use regionfit_oracle::HighsOracle;
use regionfit_sampler::{
    BranchAndCutSampler, FeasibilityOracle, HitAndRunSampler, SamplingError, VolumeEstimator,
};
use regionfit_test::lp::AUXILIARY_LP;
use regionfit_test::{triangle_grid, FlakyOracle};

fn flaky(healthy: usize) -> FlakyOracle<HighsOracle> {
    FlakyOracle::new(HighsOracle::default(), healthy)
}

fn auxiliary_model() -> ConstraintModel {
    let declared = vec!["x".to_string(), "y".to_string()];
    ConstraintModel::from_lp_str(AUXILIARY_LP, Some(&declared)).unwrap()
}

#[test]
fn branch_and_cut_restores_on_failure() {
    let mut model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
    let before = model.region().clone();
    let sampler = BranchAndCutSampler::new(flaky(0), BranchAndCutConfig::default());
    let err = sampler.sample(&mut model, 10, true).unwrap_err();
    assert!(matches!(err, SamplingError::Oracle(_)));
    assert_eq!(model.region(), &before);
}

#[test]
fn hit_and_run_restores_at_every_failure_point() {
    for healthy in 0..12 {
        let mut model = auxiliary_model();
        let before = model.region().clone();
        let mut sampler = HitAndRunSampler::new(flaky(healthy), HitAndRunConfig::default(), None);
        let result = sampler.sample(&mut model, 20, 200, Some(healthy as u64));
        assert!(result.is_err(), "healthy = {healthy}");
        assert_eq!(model.region(), &before, "healthy = {healthy}");
    }
}

#[test]
fn volume_restores_at_every_failure_point() {
    for strategy in [VolumeStrategy::BoxMonteCarlo, VolumeStrategy::Hypercube] {
        for healthy in 0..8 {
            let mut model = auxiliary_model();
            let before = model.region().clone();
            let config = VolumeConfig {
                strategy,
                box_samples: 50,
                ..VolumeConfig::default()
            };
            let mut estimator = VolumeEstimator::new(flaky(healthy), config, Some(4));
            let _ = estimator.estimate(&mut model);
            assert_eq!(model.region(), &before);
        }
    }
}

#[test]
fn feasibility_restores_between_rows() {
    let mut model = auxiliary_model();
    let before = model.region().clone();
    let batch = SampleSet::from_rows(
        vec!["x".to_string(), "y".to_string()],
        vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![3.0, 3.0]],
    )
    .unwrap();

    let verdicts = FeasibilityOracle::new(HighsOracle::default())
        .is_satisfied(&mut model, &batch)
        .unwrap();
    assert_eq!(verdicts, vec![true, true, false]);
    assert_eq!(model.region(), &before);

    assert!(FeasibilityOracle::new(flaky(1))
        .is_satisfied(&mut model, &batch)
        .is_err());
    assert_eq!(model.region(), &before);
}

#[test]
fn successful_calls_leave_model_identical() {
    let mut model = auxiliary_model();
    let before = model.region().clone();
    let oracle = HighsOracle::default();

    BranchAndCutSampler::new(&oracle, BranchAndCutConfig::default())
        .sample(&mut model, 5, true)
        .unwrap();
    HitAndRunSampler::new(&oracle, HitAndRunConfig::default(), Some(8))
        .sample(&mut model, 5, 100, None)
        .unwrap();
    VolumeEstimator::new(&oracle, VolumeConfig::default(), Some(8))
        .estimate(&mut model)
        .unwrap();
    assert_eq!(model.region(), &before);
}
