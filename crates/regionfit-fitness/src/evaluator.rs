//! Recall, precision and fitness of one compiled candidate.

use regionfit_config::{
    BranchAndCutConfig, EngineConfig, FitnessConfig, HitAndRunConfig, SamplerPolicy,
};
use regionfit_core::SampleSet;
use regionfit_model::ConstraintModel;
use regionfit_oracle::SolverOracle;
use regionfit_sampler::{BranchAndCutSampler, FeasibilityOracle, HitAndRunSampler};
use tracing::{debug, trace};

use crate::dataset::{ReferenceSet, CLASS_COLUMN};
use crate::error::{EvaluationError, Result};
use crate::metric::{NearestNeighbourOverlap, PrecisionMetric};
use crate::policy::{HarmonicMeanPolicy, ScoringPolicy};

/// Scores a candidate model against reference rows.
///
/// Recall is the share of reference rows the model accepts. Precision
/// compares an equal-sized sample of the model's own region to the
/// reference through a [`PrecisionMetric`]. A [`ScoringPolicy`] combines
/// the two.
///
/// # Example
///
/// ```
/// use regionfit_config::EngineConfig;
/// use regionfit_core::{Objective, Region, Relation, Variable};
/// use regionfit_fitness::{FitnessEvaluator, ReferenceSet};
/// use regionfit_model::ConstraintModel;
/// use regionfit_oracle::HighsOracle;
///
/// let mut region = Region::new();
/// region.add_variable(Variable::integer("x", 0.0, 9.0).unwrap()).unwrap();
/// region
///     .add_named_constraint(None, &[("x", 1.0)], Relation::LessEq, 2.0)
///     .unwrap();
/// let mut model = ConstraintModel::new(region, Objective::zero(1)).unwrap();
///
/// let reference = ReferenceSet::from_csv_str("x\n0\n1\n2\n5\n").unwrap();
/// let evaluator = FitnessEvaluator::new(HighsOracle::default(), &EngineConfig::default());
/// assert_eq!(evaluator.recall(&reference, &mut model).unwrap(), 0.75);
/// ```
#[derive(Debug)]
pub struct FitnessEvaluator<O> {
    oracle: O,
    fitness: FitnessConfig,
    branch_and_cut: BranchAndCutConfig,
    hit_and_run: HitAndRunConfig,
    seed: Option<u64>,
    metric: Box<dyn PrecisionMetric>,
    policy: Box<dyn ScoringPolicy>,
}

impl<O: SolverOracle> FitnessEvaluator<O> {
    /// Evaluator with the default metric and a harmonic-mean policy using
    /// the configured length penalty.
    pub fn new(oracle: O, config: &EngineConfig) -> Self {
        Self {
            oracle,
            fitness: config.fitness.clone(),
            branch_and_cut: config.branch_and_cut.clone(),
            hit_and_run: config.hit_and_run.clone(),
            seed: config.random_seed,
            metric: Box::new(NearestNeighbourOverlap),
            policy: Box::new(HarmonicMeanPolicy::from_config(&config.fitness)),
        }
    }

    pub fn with_metric(mut self, metric: impl PrecisionMetric + 'static) -> Self {
        self.metric = Box::new(metric);
        self
    }

    pub fn with_policy(mut self, policy: impl ScoringPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn config(&self) -> &FitnessConfig {
        &self.fitness
    }

    /// The sampler used for `model`: `Auto` resolves to branch-and-cut when
    /// every declared variable is integer and to hit-and-run otherwise.
    pub fn sampler_for(&self, model: &ConstraintModel) -> SamplerPolicy {
        match self.fitness.sampler {
            SamplerPolicy::Auto if model.declared_variables().all(|v| v.is_integer()) => {
                SamplerPolicy::BranchAndCut
            }
            SamplerPolicy::Auto => SamplerPolicy::HitAndRun,
            explicit => explicit,
        }
    }

    /// Share of reference rows the model accepts.
    pub fn recall(&self, reference: &ReferenceSet, model: &mut ConstraintModel) -> Result<f64> {
        if reference.is_empty() {
            return Err(EvaluationError::EmptyReference);
        }
        let verdicts = FeasibilityOracle::new(&self.oracle).is_satisfied(model, reference.points())?;
        let positives = verdicts.iter().filter(|&&ok| ok).count();
        trace!(event = "recall", positives, rows = verdicts.len());
        Ok(positives as f64 / verdicts.len() as f64)
    }

    /// Up to `n` points of the model's own region over its declared columns.
    pub fn candidate_sample(&self, model: &mut ConstraintModel, n: usize) -> Result<SampleSet> {
        let samples = match self.sampler_for(model) {
            SamplerPolicy::HitAndRun => {
                HitAndRunSampler::new(&self.oracle, self.hit_and_run.clone(), self.seed)
                    .sample_default(model, n, None)?
            }
            _ => BranchAndCutSampler::new(&self.oracle, self.branch_and_cut.clone())
                .sample_default(model, n)?,
        };
        Ok(samples)
    }

    /// Overlap between the reference and an equal-sized sample of the model.
    ///
    /// Reference columns the model does not declare are zero-filled in the
    /// candidate sample.
    pub fn precision(&self, reference: &ReferenceSet, model: &mut ConstraintModel) -> Result<f64> {
        let candidate = self
            .candidate_sample(model, reference.len())?
            .aligned_to(reference.columns());
        let precision = self.metric.precision(reference.points(), &candidate);
        trace!(
            event = "precision",
            precision,
            candidate_points = candidate.len(),
        );
        Ok(precision)
    }

    /// Fitness of `model`, larger is better. Recall under the configured
    /// floor scores zero without sampling.
    pub fn fitness(
        &self,
        reference: &ReferenceSet,
        model: &mut ConstraintModel,
        phenotype_len: usize,
    ) -> Result<f64> {
        let recall = self.recall(reference, model)?;
        if recall < self.fitness.recall_floor {
            debug!(event = "fitness_evaluated", recall, fitness = 0.0);
            return Ok(0.0);
        }
        let precision = self.precision(reference, model)?;
        let fitness = self.policy.score(recall, precision, phenotype_len);
        debug!(
            event = "fitness_evaluated",
            recall,
            precision,
            fitness,
            phenotype_len,
        );
        Ok(fitness)
    }

    /// Confusion counts for a table with an optional `class` column; rows
    /// without a label count as positive.
    pub fn confusion_matrix(
        &self,
        labelled: &SampleSet,
        model: &mut ConstraintModel,
    ) -> Result<ConfusionMatrix> {
        let (points, labels) = labelled.split_column(CLASS_COLUMN);
        let verdicts = FeasibilityOracle::new(&self.oracle).is_satisfied(model, &points)?;
        Ok(ConfusionMatrix::from_verdicts(labels.as_deref(), &verdicts))
    }
}

/// Outcome counts of classifying labelled rows with a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Tallies `verdicts` against `labels` (non-zero is positive). Without
    /// labels every row is positive.
    pub fn from_verdicts(labels: Option<&[f64]>, verdicts: &[bool]) -> Self {
        let mut matrix = Self::default();
        for (row, &accepted) in verdicts.iter().enumerate() {
            let positive = labels.map_or(true, |l| l[row] != 0.0);
            match (positive, accepted) {
                (true, true) => matrix.true_positives += 1,
                (true, false) => matrix.false_negatives += 1,
                (false, true) => matrix.false_positives += 1,
                (false, false) => matrix.true_negatives += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}
