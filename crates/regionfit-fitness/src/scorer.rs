//! The fitness entry point used by the outer search loop.

use std::fs;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use regionfit_model::{ConstraintModel, ModelCompiler, ZimplCompiler};
use regionfit_oracle::SolverOracle;
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, Distribution};
use crate::error::{EvaluationError, Result};
use crate::evaluator::FitnessEvaluator;
use crate::template::CandidateTemplate;

/// Fitness awarded to candidates that cannot be evaluated.
pub const WORST_FITNESS: f64 = 0.0;

const SOURCE_FILE: &str = "candidate.zpl";

/// One individual of the search population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    /// Constraint text produced by the grammar, if mapping succeeded.
    pub phenotype: Option<String>,
    /// Set when there was no phenotype to score.
    pub invalid: bool,
    /// Set when the merged source failed to compile.
    pub runtime_error: bool,
    /// Last fitness assigned by a scorer.
    pub fitness: Option<f64>,
}

impl Candidate {
    pub fn new(phenotype: impl Into<String>) -> Self {
        Self {
            phenotype: Some(phenotype.into()),
            ..Self::default()
        }
    }

    pub fn without_phenotype() -> Self {
        Self::default()
    }
}

/// Compiles candidates against a template and scores them on a dataset.
///
/// Scoring never fails: a missing phenotype marks the candidate `invalid`,
/// a compilation failure marks it `runtime_error`, and any other error is
/// logged. All three score [`WORST_FITNESS`].
#[derive(Debug)]
pub struct CandidateScorer<O, C = ZimplCompiler> {
    evaluator: FitnessEvaluator<O>,
    compiler: C,
    template: CandidateTemplate,
    dataset: Dataset,
}

impl<O, C> CandidateScorer<O, C>
where
    O: SolverOracle,
    C: ModelCompiler,
{
    pub fn new(
        evaluator: FitnessEvaluator<O>,
        compiler: C,
        template: CandidateTemplate,
        dataset: Dataset,
    ) -> Self {
        Self {
            evaluator,
            compiler,
            template,
            dataset,
        }
    }

    pub fn evaluator(&self) -> &FitnessEvaluator<O> {
        &self.evaluator
    }

    pub fn template(&self) -> &CandidateTemplate {
        &self.template
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Scores `candidate` on `distribution` and records the outcome on it.
    pub fn score(&self, candidate: &mut Candidate, distribution: Distribution) -> f64 {
        let fitness = match candidate.phenotype.as_deref() {
            None => {
                candidate.invalid = true;
                WORST_FITNESS
            }
            Some(phenotype) => {
                let program = self.template.merge(phenotype);
                match self.evaluate_source(&program, distribution) {
                    Ok(fitness) => fitness,
                    Err(err) if err.is_compilation_failure() => {
                        debug!(event = "candidate_rejected", error = %err);
                        candidate.runtime_error = true;
                        WORST_FITNESS
                    }
                    Err(err) => {
                        warn!(event = "candidate_failed", %distribution, error = %err);
                        WORST_FITNESS
                    }
                }
            }
        };
        candidate.fitness = Some(fitness);
        fitness
    }

    /// Compiles `source` in a private directory and scores the model.
    ///
    /// The length penalty applies to the whole source.
    pub fn evaluate_source(&self, source: &str, distribution: Distribution) -> Result<f64> {
        let reference = self.dataset.get(distribution);
        let workdir = tempfile::Builder::new()
            .prefix("regionfit-")
            .tempdir()
            .map_err(|e| EvaluationError::io(std::env::temp_dir(), e))?;
        let path = workdir.path().join(SOURCE_FILE);
        fs::write(&path, source).map_err(|e| EvaluationError::io(&path, e))?;

        let artifacts = self.compiler.compile(&path)?;
        let mut model = ConstraintModel::from_artifacts(artifacts, Some(reference.columns()))?;
        self.evaluator
            .fitness(reference, &mut model, source.chars().count())
    }

    /// Fitness of the unmodified ground-truth source.
    pub fn ground_truth_fitness(&self, distribution: Distribution) -> Result<f64> {
        self.evaluate_source(self.template.ground_truth(), distribution)
    }

    /// Scores every candidate in parallel, on a pool of
    /// `fitness.parallelism` threads (all cores when unset).
    pub fn score_population(
        &self,
        candidates: &mut [Candidate],
        distribution: Distribution,
    ) -> Vec<f64> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(threads) = self.evaluator.config().parallelism {
            builder = builder.num_threads(threads);
        }

        let (scores, threads) = match builder.build() {
            Ok(pool) => (
                pool.install(|| {
                    candidates
                        .par_iter_mut()
                        .map(|candidate| self.score(candidate, distribution))
                        .collect::<Vec<_>>()
                }),
                pool.current_num_threads(),
            ),
            Err(err) => {
                warn!(event = "thread_pool_unavailable", error = %err);
                let scores = candidates
                    .iter_mut()
                    .map(|candidate| self.score(candidate, distribution))
                    .collect();
                (scores, 1)
            }
        };

        let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        info!(
            event = "population_scored",
            %distribution,
            candidates = candidates.len(),
            threads,
            best,
            invalid = candidates.iter().filter(|c| c.invalid).count(),
            runtime_errors = candidates.iter().filter(|c| c.runtime_error).count(),
        );
        scores
    }
}
