//! Reference data: the rows a candidate model must accept.

use std::fmt;
use std::fs;
use std::path::Path;

use rand::seq::index;
use rand::Rng;
use regionfit_config::FitnessConfig;
use regionfit_core::SampleSet;
use regionfit_sampler::SamplerRng;
use tracing::debug;

use crate::error::{EvaluationError, Result};

/// Name of the optional label column in reference tables.
pub const CLASS_COLUMN: &str = "class";

/// Which reference set a candidate is scored against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Distribution {
    #[default]
    Training,
    Test,
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Training => write!(f, "training"),
            Distribution::Test => write!(f, "test"),
        }
    }
}

/// Rows known to be feasible under the ground truth.
///
/// A `class` column is accepted only when every entry is true, and is
/// dropped on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    points: SampleSet,
}

impl ReferenceSet {
    pub fn new(table: SampleSet) -> Result<Self> {
        let (points, labels) = table.split_column(CLASS_COLUMN);
        if let Some(labels) = labels {
            if let Some(row) = labels.iter().position(|&label| label == 0.0) {
                return Err(EvaluationError::InfeasibleReferenceRow { row });
            }
        }
        Ok(Self { points })
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::new(SampleSet::from_csv_str(text)?)
    }

    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EvaluationError::io(path, e))?;
        Self::from_csv_str(&text)
    }

    pub fn points(&self) -> &SampleSet {
        &self.points
    }

    pub fn columns(&self) -> &[String] {
        self.points.columns()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// At most `size` rows drawn without replacement, in their original order.
    pub fn subsample<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Self {
        if self.len() <= size {
            return self.clone();
        }
        let mut indices = index::sample(rng, self.len(), size).into_vec();
        indices.sort_unstable();
        Self {
            points: self.points.select_rows(&indices),
        }
    }
}

/// Training and test reference sets for one problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    training: ReferenceSet,
    test: ReferenceSet,
}

impl Dataset {
    pub fn new(training: ReferenceSet, test: ReferenceSet) -> Self {
        Self { training, test }
    }

    /// Loads both CSV files and subsamples them to the configured sizes.
    pub fn load(
        training: impl AsRef<Path>,
        test: impl AsRef<Path>,
        config: &FitnessConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        let dataset = Self::new(
            ReferenceSet::from_csv_file(training)?,
            ReferenceSet::from_csv_file(test)?,
        );
        Ok(dataset.subsampled(config, seed))
    }

    /// Applies `training_size` and `test_size` from `config`.
    pub fn subsampled(self, config: &FitnessConfig, seed: Option<u64>) -> Self {
        let mut rng = SamplerRng::new(seed);
        let training = match config.training_size {
            Some(size) => self.training.subsample(size, &mut rng),
            None => self.training,
        };
        let test = match config.test_size {
            Some(size) => self.test.subsample(size, &mut rng),
            None => self.test,
        };
        debug!(
            event = "dataset_loaded",
            training_rows = training.len(),
            test_rows = test.len(),
        );
        Self { training, test }
    }

    pub fn get(&self, distribution: Distribution) -> &ReferenceSet {
        match distribution {
            Distribution::Training => &self.training,
            Distribution::Test => &self.test,
        }
    }

    pub fn training(&self) -> &ReferenceSet {
        &self.training
    }

    pub fn test(&self) -> &ReferenceSet {
        &self.test
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionfit_test::data::{STAIRCASE_MIXED_CSV, TRIANGLE_LABELLED_CSV, TRIANGLE_NEGATIVE_CSV};

    #[test]
    fn test_class_column_dropped() {
        let reference = ReferenceSet::from_csv_str(TRIANGLE_LABELLED_CSV).unwrap();
        assert_eq!(reference.columns(), ["x", "y"]);
        assert_eq!(reference.len(), 6);
    }

    #[test]
    fn test_negative_row_refused() {
        let err = ReferenceSet::from_csv_str(TRIANGLE_NEGATIVE_CSV).unwrap_err();
        assert!(matches!(err, EvaluationError::InfeasibleReferenceRow { row: 1 }));
    }

    #[test]
    fn test_subsample_keeps_order_and_size() {
        let reference = ReferenceSet::from_csv_str(STAIRCASE_MIXED_CSV).unwrap();
        let mut rng = SamplerRng::seeded(7);
        let small = reference.subsample(4, &mut rng);
        assert_eq!(small.len(), 4);

        let positions: Vec<usize> = small
            .points()
            .iter()
            .map(|row| reference.points().iter().position(|r| r == row).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(reference.subsample(100, &mut rng), reference);
    }

    #[test]
    fn test_subsampled_uses_config_sizes() {
        let reference = ReferenceSet::from_csv_str(STAIRCASE_MIXED_CSV).unwrap();
        let config = FitnessConfig {
            training_size: Some(3),
            ..FitnessConfig::default()
        };
        let dataset = Dataset::new(reference.clone(), reference).subsampled(&config, Some(1));
        assert_eq!(dataset.get(Distribution::Training).len(), 3);
        assert_eq!(dataset.get(Distribution::Test).len(), 10);
    }
}
