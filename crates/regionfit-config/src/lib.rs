//! Configuration system for RegionFit.
//!
//! Load engine configuration from TOML or YAML files to control the solver
//! oracle, the samplers, the volume estimator and fitness scoring without
//! code changes. Every field has a default, so partial files are fine.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use regionfit_config::{EngineConfig, SamplerPolicy};
//! use std::time::Duration;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     random_seed = 7
//!
//!     [oracle]
//!     time_limit_secs = 30
//!
//!     [hit_and_run]
//!     budget = 2000
//!
//!     [fitness]
//!     sampler = "hit_and_run"
//! "#).unwrap();
//!
//! assert_eq!(config.oracle.time_limit(), Duration::from_secs(30));
//! assert_eq!(config.hit_and_run.budget, 2000);
//! assert_eq!(config.hit_and_run.max_consecutive_failures, 5);
//! assert_eq!(config.fitness.sampler, SamplerPolicy::HitAndRun);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use regionfit_config::EngineConfig;
//!
//! let config = EngineConfig::load("regionfit.toml").unwrap_or_default();
//! assert_eq!(config.volume.box_samples, 2000);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Random seed for reproducible sampling. `None` seeds from the OS.
    pub random_seed: Option<u64>,

    /// Solver oracle knobs consumed at session start.
    pub oracle: OracleConfig,

    /// Branch-and-cut (solution pool) sampler.
    pub branch_and_cut: BranchAndCutConfig,

    /// Hit-and-run sampler.
    pub hit_and_run: HitAndRunConfig,

    /// Volume estimator.
    pub volume: VolumeConfig,

    /// Labelled dataset generator.
    pub generator: GeneratorConfig,

    /// Fitness evaluation.
    pub fitness: FitnessConfig,

    /// External model compiler.
    pub compiler: CompilerConfig,
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or fails
    /// [`EngineConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Serializes to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Serializes to a YAML string.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the per-call solver time limit.
    pub fn with_time_limit_secs(mut self, seconds: u64) -> Self {
        self.oracle.time_limit_secs = seconds;
        self
    }

    /// Sets the hit-and-run line-search budget.
    pub fn with_hit_and_run_budget(mut self, budget: usize) -> Self {
        self.hit_and_run.budget = budget;
        self
    }

    /// Sets the fitness sampler policy.
    pub fn with_sampler(mut self, sampler: SamplerPolicy) -> Self {
        self.fitness.sampler = sampler;
        self
    }

    /// Rejects values that would make the engine loop or divide by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oracle.time_limit_secs == 0 {
            return Err(ConfigError::Invalid(
                "oracle.time_limit_secs must be positive".into(),
            ));
        }
        if self.oracle.node_limit == 0 {
            return Err(ConfigError::Invalid(
                "oracle.node_limit must be positive".into(),
            ));
        }
        if self.oracle.threads == 0 {
            return Err(ConfigError::Invalid("oracle.threads must be positive".into()));
        }
        if !(self.oracle.tolerance > 0.0 && self.oracle.tolerance < 1.0) {
            return Err(ConfigError::Invalid(
                "oracle.tolerance must lie in (0, 1)".into(),
            ));
        }
        if self.hit_and_run.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid(
                "hit_and_run.max_consecutive_failures must be positive".into(),
            ));
        }
        if !(self.hit_and_run.unbounded_sentinel.is_finite()
            && self.hit_and_run.unbounded_sentinel > 0.0)
        {
            return Err(ConfigError::Invalid(
                "hit_and_run.unbounded_sentinel must be finite and positive".into(),
            ));
        }
        if self.volume.box_samples == 0 {
            return Err(ConfigError::Invalid(
                "volume.box_samples must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.volume.reporting_floor) {
            return Err(ConfigError::Invalid(
                "volume.reporting_floor must lie in [0, 1]".into(),
            ));
        }
        if self.generator.draw_budget == 0 {
            return Err(ConfigError::Invalid(
                "generator.draw_budget must be positive".into(),
            ));
        }
        if self.generator.class_column.is_empty() {
            return Err(ConfigError::Invalid(
                "generator.class_column must not be empty".into(),
            ));
        }
        if self.fitness.length_penalty < 0.0 || self.fitness.recall_floor < 0.0 {
            return Err(ConfigError::Invalid(
                "fitness penalties must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Solver oracle configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OracleConfig {
    /// Wall-clock ceiling for a single solver call.
    pub time_limit_secs: u64,

    /// Maximum subproblem solves per solution-pool enumeration.
    pub node_limit: usize,

    /// Numeric tolerance for feasibility and integrality.
    pub tolerance: f64,

    /// Emit per-call solver statistics to the log.
    pub log_to_console: bool,

    /// Worker threads the backend may use for one solve.
    pub threads: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 600,
            node_limit: 1_000_000,
            tolerance: 1e-6,
            log_to_console: false,
            threads: 1,
        }
    }
}

impl OracleConfig {
    /// Returns the time limit as a Duration.
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }
}

/// Branch-and-cut sampler configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BranchAndCutConfig {
    /// Coerce continuous variables to integer while pooling.
    pub relax_to_integer: bool,
}

/// Hit-and-run sampler configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HitAndRunConfig {
    /// Line searches available to one sampling call.
    pub budget: usize,

    /// Failures in a row before the chain is reseeded.
    pub max_consecutive_failures: usize,

    /// Finite stand-in for an unbounded step length.
    pub unbounded_sentinel: f64,
}

impl Default for HitAndRunConfig {
    fn default() -> Self {
        Self {
            budget: 5000,
            max_consecutive_failures: 5,
            unbounded_sentinel: 1e6,
        }
    }
}

/// Volume estimation heuristic run before the precise fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStrategy {
    /// Uniform samples in a tight box from four extreme points.
    #[default]
    BoxMonteCarlo,

    /// Largest anchored hypercube at two optimal vertices.
    Hypercube,
}

/// Volume estimator configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct VolumeConfig {
    /// Heuristic used by `estimate`.
    pub strategy: VolumeStrategy,

    /// Uniform samples drawn by the box Monte Carlo heuristic.
    pub box_samples: usize,

    /// Estimates below this are recomputed by enumeration.
    pub reporting_floor: f64,

    /// Solution cap for the enumeration fallback.
    pub pool_cap: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            strategy: VolumeStrategy::BoxMonteCarlo,
            box_samples: 2000,
            reporting_floor: 0.001,
            pool_cap: 100_000,
        }
    }
}

/// Rejection sampling of labelled rows from the bounding box.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GeneratorConfig {
    /// Uniform draws available to one generator call.
    pub draw_budget: usize,

    /// Name of the 1/0 label column in labelled output.
    pub class_column: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            draw_budget: 1_000_000,
            class_column: "class".to_string(),
        }
    }
}

/// Sampler used to draw the candidate's own points for precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerPolicy {
    /// Branch-and-cut when every declared variable is integer, else hit-and-run.
    #[default]
    Auto,

    /// Always enumerate through the solution pool.
    BranchAndCut,

    /// Always use the hit-and-run chain.
    HitAndRun,
}

/// Fitness evaluation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FitnessConfig {
    /// Recall below this short-circuits the score to zero.
    pub recall_floor: f64,

    /// Penalty per character of the candidate model text.
    pub length_penalty: f64,

    /// Sampler for the precision reference set.
    pub sampler: SamplerPolicy,

    /// Subsample the training set to at most this many rows.
    pub training_size: Option<usize>,

    /// Subsample the test set to at most this many rows.
    pub test_size: Option<usize>,

    /// Worker threads for population scoring. `None` uses all cores.
    pub parallelism: Option<usize>,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            recall_floor: 1e-6,
            length_penalty: 1e-6,
            sampler: SamplerPolicy::Auto,
            training_size: None,
            test_size: None,
            parallelism: None,
        }
    }
}

/// External model compiler configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CompilerConfig {
    /// Path or name of the compiler executable.
    pub binary: PathBuf,

    /// Keep compiled artifacts after a model is dropped.
    pub keep_artifacts: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("zimpl"),
            keep_artifacts: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_parsing() {
        let toml = r#"
            random_seed = 42

            [oracle]
            time_limit_secs = 30
            node_limit = 5000
            log_to_console = true
            threads = 4

            [branch_and_cut]
            relax_to_integer = true

            [volume]
            strategy = "hypercube"
            reporting_floor = 0.01

            [generator]
            draw_budget = 500

            [fitness]
            sampler = "branch_and_cut"
            training_size = 400
        "#;

        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.oracle.time_limit(), Duration::from_secs(30));
        assert_eq!(config.oracle.node_limit, 5000);
        assert!(config.oracle.log_to_console);
        assert_eq!(config.oracle.threads, 4);
        assert!(config.branch_and_cut.relax_to_integer);
        assert_eq!(config.volume.strategy, VolumeStrategy::Hypercube);
        assert_eq!(config.volume.box_samples, 2000);
        assert_eq!(config.generator.draw_budget, 500);
        assert_eq!(config.generator.class_column, "class");
        assert_eq!(config.fitness.sampler, SamplerPolicy::BranchAndCut);
        assert_eq!(config.fitness.training_size, Some(400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
            random_seed: 42
            hit_and_run:
              budget: 100
              max_consecutive_failures: 3
            compiler:
              binary: /opt/zimpl/bin/zimpl
              keep_artifacts: true
        "#;

        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.hit_and_run.budget, 100);
        assert_eq!(config.hit_and_run.max_consecutive_failures, 3);
        assert_eq!(config.hit_and_run.unbounded_sentinel, 1e6);
        assert_eq!(config.compiler.binary, PathBuf::from("/opt/zimpl/bin/zimpl"));
        assert!(config.compiler.keep_artifacts);
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.oracle.time_limit_secs, 600);
        assert_eq!(config.oracle.threads, 1);
        assert_eq!(config.hit_and_run.max_consecutive_failures, 5);
        assert_eq!(config.volume.reporting_floor, 0.001);
        assert_eq!(config.volume.pool_cap, 100_000);
        assert_eq!(config.fitness.recall_floor, 1e-6);
        assert_eq!(config.fitness.sampler, SamplerPolicy::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_random_seed(123)
            .with_time_limit_secs(60)
            .with_hit_and_run_budget(10)
            .with_sampler(SamplerPolicy::HitAndRun);

        assert_eq!(config.random_seed, Some(123));
        assert_eq!(config.oracle.time_limit_secs, 60);
        assert_eq!(config.hit_and_run.budget, 10);
        assert_eq!(config.fitness.sampler, SamplerPolicy::HitAndRun);
    }

    #[test]
    fn test_validate_rejects_zero_failures() {
        let mut config = EngineConfig::default();
        config.hit_and_run.max_consecutive_failures = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let mut config = EngineConfig::default();
        config.oracle.threads = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_generator_budget() {
        let mut config = EngineConfig::default();
        config.generator.draw_budget = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::default().with_random_seed(9);
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = EngineConfig::default().with_sampler(SamplerPolicy::HitAndRun);
        let text = config.to_yaml_string().unwrap();
        assert!(text.contains("hit_and_run"));
        assert_eq!(EngineConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/regionfit.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
