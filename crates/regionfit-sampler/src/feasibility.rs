//! Membership of data rows in a model's feasible region.

use regionfit_core::{SampleSet, FEASIBILITY_TOLERANCE};
use regionfit_model::ConstraintModel;
use regionfit_oracle::SolverOracle;
use tracing::debug;

use crate::error::{Result, SamplingError};

/// Classifies rows as inside or outside a model's region.
///
/// Models without auxiliary variables are checked in-process. Otherwise each
/// row pins the declared variables and asks the oracle whether the remaining
/// auxiliary variables can be completed.
#[derive(Debug, Clone)]
pub struct FeasibilityOracle<O> {
    oracle: O,
    tolerance: f64,
}

impl<O: SolverOracle> FeasibilityOracle<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            tolerance: FEASIBILITY_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// One verdict per row of `batch`, in row order.
    ///
    /// Batch columns are matched to declared variables by name; extra
    /// columns are ignored.
    pub fn is_satisfied(&self, model: &mut ConstraintModel, batch: &SampleSet) -> Result<Vec<bool>> {
        let rows = aligned_rows(model, batch)?;

        if let Some(evaluator) = model.evaluator() {
            return Ok(evaluator.evaluate(&rows));
        }

        debug!(
            event = "feasibility_per_row",
            rows = rows.len(),
            declared = model.declared_dimension(),
        );
        let mut verdicts = Vec::with_capacity(rows.len());
        for row in &rows {
            verdicts.push(self.check_row(model, row)?);
        }
        Ok(verdicts)
    }

    fn check_row(&self, model: &mut ConstraintModel, row: &[f64]) -> Result<bool> {
        let mut pinned = Vec::with_capacity(row.len());
        for (variable, &value) in model.declared_variables().zip(row) {
            if !variable.contains(value, self.tolerance) {
                return Ok(false);
            }
            pinned.push(if variable.is_integer() { value.round() } else { value });
        }
        let mut scope = model.scope();
        scope.pin_declared(&pinned)?;
        Ok(self.oracle.check_feasible(scope.region())?)
    }
}

/// Rows of `batch` re-ordered to the model's declared columns.
pub(crate) fn aligned_rows(model: &ConstraintModel, batch: &SampleSet) -> Result<Vec<Vec<f64>>> {
    let mapping = model
        .columns()
        .iter()
        .map(|name| {
            batch
                .column_index(name)
                .ok_or_else(|| SamplingError::MissingColumn(name.clone()))
        })
        .collect::<Result<Vec<usize>>>()?;
    Ok(batch
        .iter()
        .map(|row| mapping.iter().map(|&idx| row[idx]).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionfit_core::Objective;
    use regionfit_model::ConstraintModel;
    use regionfit_oracle::HighsOracle;
    use regionfit_test::lp::AUXILIARY_LP;
    use regionfit_test::triangle_grid;

    fn batch(columns: &[&str], rows: &[&[f64]]) -> SampleSet {
        SampleSet::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter().map(|r| r.to_vec()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_fast_path_aligns_by_name() {
        let mut model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
        let oracle = FeasibilityOracle::new(HighsOracle::default());
        let rows = batch(&["y", "extra", "x"], &[&[2.0, 9.0, 0.0], &[2.0, 9.0, 1.0]]);
        assert_eq!(oracle.is_satisfied(&mut model, &rows).unwrap(), vec![true, false]);
    }

    #[test]
    fn test_missing_column() {
        let mut model = ConstraintModel::new(triangle_grid(), Objective::zero(2)).unwrap();
        let oracle = FeasibilityOracle::new(HighsOracle::default());
        let err = oracle
            .is_satisfied(&mut model, &batch(&["x"], &[&[0.0]]))
            .unwrap_err();
        assert!(matches!(err, SamplingError::MissingColumn(ref c) if c == "y"));
    }

    #[test]
    fn test_pinned_path_with_auxiliary_variables() {
        let declared = vec!["x".to_string(), "y".to_string()];
        let mut model = ConstraintModel::from_lp_str(AUXILIARY_LP, Some(&declared)).unwrap();
        let before = model.region().clone();
        let oracle = FeasibilityOracle::new(HighsOracle::default());
        let rows = batch(
            &["x", "y"],
            &[&[1.0, 2.0], &[3.0, 1.0], &[0.5, 0.0], &[4.0, 0.0], &[0.0, 0.0]],
        );
        assert_eq!(
            oracle.is_satisfied(&mut model, &rows).unwrap(),
            vec![true, false, false, false, true]
        );
        assert_eq!(model.region(), &before);
    }
}
