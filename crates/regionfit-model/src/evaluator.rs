//! In-process membership test for models without auxiliary variables.

use std::fmt;

use regionfit_core::{Region, FEASIBILITY_TOLERANCE};

/// Classifies rows over a model's declared variables.
///
/// Rows are in declared-column order. Output order matches input order.
pub trait ConstraintEvaluator: Send + Sync + fmt::Debug {
    fn evaluate(&self, batch: &[Vec<f64>]) -> Vec<bool>;
}

/// Checks rows directly against a snapshot of the load-time region.
#[derive(Debug, Clone)]
pub struct LinearEvaluator {
    region: Region,
    declared: Vec<usize>,
    tolerance: f64,
}

impl LinearEvaluator {
    /// `declared[k]` is the region index of column `k`.
    pub fn new(region: Region, declared: Vec<usize>) -> Self {
        Self {
            region,
            declared,
            tolerance: FEASIBILITY_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn scatter(&self, row: &[f64]) -> Vec<f64> {
        let mut point = vec![0.0; self.region.dimension()];
        for (&idx, &value) in self.declared.iter().zip(row) {
            point[idx] = value;
        }
        point
    }
}

impl ConstraintEvaluator for LinearEvaluator {
    fn evaluate(&self, batch: &[Vec<f64>]) -> Vec<bool> {
        batch
            .iter()
            .map(|row| {
                row.len() == self.declared.len()
                    && self.region.is_satisfied(&self.scatter(row), self.tolerance)
            })
            .collect()
    }
}
