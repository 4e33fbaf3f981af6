//! Session wiring: one validated configuration, one oracle, and the
//! components built from them.

use std::path::Path;

use regionfit_config::{ConfigError, EngineConfig};
use regionfit_fitness::{
    CandidateScorer, CandidateTemplate, Dataset, EvaluationError, FitnessEvaluator,
};
use regionfit_model::{ConstraintModel, ModelCompiler, ModelError, ZimplCompiler};
use regionfit_oracle::{OracleSettings, HighsOracle, SolverOracle};
use regionfit_sampler::{
    BranchAndCutSampler, FeasibilityOracle, HitAndRunSampler, LabelledGenerator, VolumeEstimator,
};
use thiserror::Error;
use tracing::info;

/// Errors raised while setting up a session. These are fatal to the caller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Engine entry point.
///
/// Global knobs (solver time and node limits, console logging, random seed)
/// are read once when the session starts; every component handed out by the
/// session shares them.
#[derive(Debug, Clone)]
pub struct Session<O = HighsOracle> {
    config: EngineConfig,
    oracle: O,
}

impl Session<HighsOracle> {
    /// Starts a session backed by the in-process [`HighsOracle`].
    pub fn new(config: EngineConfig) -> Result<Self, SessionError> {
        let oracle = HighsOracle::new(OracleSettings::from(&config.oracle));
        Self::with_oracle(config, oracle)
    }

    /// Loads the configuration from a TOML or YAML file and starts a session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        Self::new(EngineConfig::load(path)?)
    }
}

impl<O: SolverOracle + Clone> Session<O> {
    /// Starts a session with a caller-supplied oracle.
    pub fn with_oracle(config: EngineConfig, oracle: O) -> Result<Self, SessionError> {
        config.validate()?;
        info!(
            event = "session_start",
            time_limit_secs = config.oracle.time_limit_secs,
            node_limit = config.oracle.node_limit,
            sampler = ?config.fitness.sampler,
            volume_strategy = ?config.volume.strategy,
            seed = config.random_seed,
            parallelism = config.fitness.parallelism,
        );
        Ok(Self { config, oracle })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn branch_and_cut(&self) -> BranchAndCutSampler<O> {
        BranchAndCutSampler::new(self.oracle.clone(), self.config.branch_and_cut.clone())
    }

    /// Hit-and-run sampler seeded with the session's `random_seed`.
    pub fn hit_and_run(&self) -> HitAndRunSampler<O> {
        HitAndRunSampler::new(
            self.oracle.clone(),
            self.config.hit_and_run.clone(),
            self.config.random_seed,
        )
    }

    pub fn feasibility(&self) -> FeasibilityOracle<O> {
        FeasibilityOracle::new(self.oracle.clone()).with_tolerance(self.config.oracle.tolerance)
    }

    pub fn volume(&self) -> VolumeEstimator<O> {
        VolumeEstimator::new(
            self.oracle.clone(),
            self.config.volume.clone(),
            self.config.random_seed,
        )
    }

    /// Labelled dataset generator seeded with the session's `random_seed`.
    pub fn generator(&self) -> LabelledGenerator<O> {
        LabelledGenerator::new(
            self.oracle.clone(),
            self.config.generator.clone(),
            self.config.random_seed,
        )
        .with_tolerance(self.config.oracle.tolerance)
    }

    pub fn evaluator(&self) -> FitnessEvaluator<O> {
        FitnessEvaluator::new(self.oracle.clone(), &self.config)
    }

    pub fn compiler(&self) -> ZimplCompiler {
        ZimplCompiler::from_config(&self.config.compiler)
    }

    /// Loads a model from an `.lp` artifact directly, or from modeling
    /// language source through the configured compiler.
    ///
    /// Compiled artifacts are removed when the model is dropped unless
    /// `compiler.keep_artifacts` is set.
    pub fn load_model(
        &self,
        path: impl AsRef<Path>,
        declared: Option<&[String]>,
    ) -> Result<ConstraintModel, SessionError> {
        let path = path.as_ref();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("lp")) {
            return Ok(ConstraintModel::from_lp_file(path, declared)?);
        }
        let artifacts = self.compiler().compile(path).map_err(ModelError::from)?;
        Ok(ConstraintModel::from_artifacts(artifacts, declared)?
            .keep_artifacts(self.config.compiler.keep_artifacts))
    }

    /// Candidate scorer over a ground-truth template and training/test CSV
    /// files, subsampled to the configured sizes.
    pub fn scorer(
        &self,
        ground_truth: impl AsRef<Path>,
        training: impl AsRef<Path>,
        test: impl AsRef<Path>,
    ) -> Result<CandidateScorer<O, ZimplCompiler>, SessionError> {
        self.scorer_with_compiler(ground_truth, training, test, self.compiler())
    }

    pub fn scorer_with_compiler<C: ModelCompiler>(
        &self,
        ground_truth: impl AsRef<Path>,
        training: impl AsRef<Path>,
        test: impl AsRef<Path>,
        compiler: C,
    ) -> Result<CandidateScorer<O, C>, SessionError> {
        let template = CandidateTemplate::load(ground_truth)?;
        let dataset = Dataset::load(training, test, &self.config.fitness, self.config.random_seed)?;
        Ok(CandidateScorer::new(
            self.evaluator(),
            compiler,
            template,
            dataset,
        ))
    }
}
