//! Scoring policies combining recall and precision into one fitness.

use std::fmt::Debug;

use regionfit_config::FitnessConfig;

/// Combines recall, precision and the candidate's source length.
pub trait ScoringPolicy: Send + Sync + Debug {
    fn score(&self, recall: f64, precision: f64, phenotype_len: usize) -> f64;
}

/// `2rp / (r + p) - length_penalty * len`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicMeanPolicy {
    pub length_penalty: f64,
}

impl HarmonicMeanPolicy {
    pub fn new(length_penalty: f64) -> Self {
        Self { length_penalty }
    }

    pub fn from_config(config: &FitnessConfig) -> Self {
        Self::new(config.length_penalty)
    }
}

impl Default for HarmonicMeanPolicy {
    fn default() -> Self {
        Self::from_config(&FitnessConfig::default())
    }
}

impl ScoringPolicy for HarmonicMeanPolicy {
    fn score(&self, recall: f64, precision: f64, phenotype_len: usize) -> f64 {
        let penalty = self.length_penalty * phenotype_len as f64;
        let total = recall + precision;
        if total <= 0.0 {
            return -penalty;
        }
        2.0 * recall * precision / total - penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmonic_mean() {
        let policy = HarmonicMeanPolicy::new(0.0);
        assert!((policy.score(1.0, 1.0, 10) - 1.0).abs() < 1e-12);
        assert!((policy.score(0.5, 1.0, 10) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(policy.score(0.0, 0.0, 10), 0.0);
    }

    #[test]
    fn test_length_penalty() {
        let policy = HarmonicMeanPolicy::default();
        assert!((policy.score(1.0, 1.0, 1000) - (1.0 - 1e-3)).abs() < 1e-12);
    }
}
