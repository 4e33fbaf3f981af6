//! The constraint model: a region, its objective and the declared columns.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use regionfit_core::{Objective, Region, Variable};
use tracing::debug;

use crate::compiler::CompiledArtifacts;
use crate::error::{ModelError, Result};
use crate::evaluator::{ConstraintEvaluator, LinearEvaluator};
use crate::lp_format;
use crate::scope::{DomainCoercion, RegionScope};

/// A compiled constraint model.
///
/// Holds the full LP region (declared variables plus any auxiliary ones the
/// compiler introduced), the objective from the LP artifact, and which
/// variables are declared. Declared variables keep region order.
///
/// The in-process evaluator exists exactly when the model has no auxiliary
/// variables. It is built from the load-time region, so scoped edits never
/// change its verdicts.
///
/// Generated artifacts are removed when the model is dropped unless
/// [`keep_artifacts`](Self::keep_artifacts) is set.
#[derive(Debug)]
pub struct ConstraintModel {
    region: Region,
    objective: Objective,
    declared: Vec<usize>,
    columns: Vec<String>,
    evaluator: Option<Box<dyn ConstraintEvaluator>>,
    has_auxiliary_variables: bool,
    revision: Option<SystemTime>,
    artifacts: Option<CompiledArtifacts>,
    keep_artifacts: bool,
}

impl ConstraintModel {
    /// Model whose variables are all declared.
    pub fn new(region: Region, objective: Objective) -> Result<Self> {
        let declared = (0..region.dimension()).collect();
        Self::build(region, objective, declared)
    }

    /// Model declaring only the variables named in `names`.
    ///
    /// Names the region does not contain are skipped.
    pub fn with_declared<S: AsRef<str>>(
        region: Region,
        objective: Objective,
        names: &[S],
    ) -> Result<Self> {
        for name in names {
            if region.index_of(name.as_ref()).is_none() {
                debug!(event = "declared_variable_missing", name = name.as_ref());
            }
        }
        let declared = (0..region.dimension())
            .filter(|&idx| {
                let name = region.variable(idx).name();
                names.iter().any(|n| n.as_ref() == name)
            })
            .collect();
        Self::build(region, objective, declared)
    }

    /// Parses an LP artifact. `declared` limits the declared variables;
    /// `None` declares all of them.
    pub fn from_lp_str(text: &str, declared: Option<&[String]>) -> Result<Self> {
        let problem = lp_format::parse(text)?;
        match declared {
            Some(names) => Self::with_declared(problem.region, problem.objective, names),
            None => Self::new(problem.region, problem.objective),
        }
    }

    pub fn from_lp_file(path: impl AsRef<Path>, declared: Option<&[String]>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| ModelError::io(path, err))?;
        Self::from_lp_str(&text, declared)
    }

    /// Loads the LP artifact of a compilation and takes ownership of the
    /// generated files.
    ///
    /// Fails with [`ModelError::StaleArtifact`] if the LP file is older than
    /// its source.
    pub fn from_artifacts(artifacts: CompiledArtifacts, declared: Option<&[String]>) -> Result<Self> {
        let source_time = modified(artifacts.source())?;
        let lp_time = modified(artifacts.lp_path())?;
        if lp_time < source_time {
            return Err(ModelError::StaleArtifact {
                source_path: artifacts.source().to_path_buf(),
                artifact: artifacts.lp_path().to_path_buf(),
            });
        }
        let mut model = Self::from_lp_file(artifacts.lp_path(), declared)?;
        model.revision = Some(source_time);
        model.artifacts = Some(artifacts);
        Ok(model)
    }

    fn build(region: Region, objective: Objective, declared: Vec<usize>) -> Result<Self> {
        for &idx in &declared {
            region.variable(idx).require_finite()?;
        }
        let objective = if objective.coefficients().len() == region.dimension() {
            objective
        } else {
            objective.resized(region.dimension())
        };
        let has_auxiliary_variables = declared.len() < region.dimension();
        let evaluator: Option<Box<dyn ConstraintEvaluator>> = if has_auxiliary_variables {
            None
        } else {
            Some(Box::new(LinearEvaluator::new(region.clone(), declared.clone())))
        };
        let columns = declared
            .iter()
            .map(|&idx| region.variable(idx).name().to_string())
            .collect();

        Ok(Self {
            region,
            objective,
            declared,
            columns,
            evaluator,
            has_auxiliary_variables,
            revision: None,
            artifacts: None,
            keep_artifacts: false,
        })
    }

    /// Keep generated artifacts on disk after the model is dropped.
    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub(crate) fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Region indices of the declared variables.
    pub fn declared(&self) -> &[usize] {
        &self.declared
    }

    /// Names of the declared variables, in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn declared_dimension(&self) -> usize {
        self.declared.len()
    }

    pub fn declared_variables(&self) -> impl Iterator<Item = &Variable> {
        self.declared.iter().map(|&idx| self.region.variable(idx))
    }

    pub fn has_auxiliary_variables(&self) -> bool {
        self.has_auxiliary_variables
    }

    pub fn evaluator(&self) -> Option<&dyn ConstraintEvaluator> {
        self.evaluator.as_deref()
    }

    /// Modification time of the source the model was compiled from.
    pub fn revision(&self) -> Option<SystemTime> {
        self.revision
    }

    pub fn artifacts(&self) -> Option<&CompiledArtifacts> {
        self.artifacts.as_ref()
    }

    /// Restricts a full-space point to the declared columns.
    pub fn project(&self, point: &[f64]) -> Vec<f64> {
        self.declared.iter().map(|&idx| point[idx]).collect()
    }

    /// Opens a self-restoring edit scope on the region.
    pub fn scope(&mut self) -> RegionScope<'_> {
        RegionScope::new(self)
    }

    /// Runs `f` with every variable coerced, restoring domains afterwards.
    pub fn with_relaxed_domains<R>(
        &mut self,
        coercion: DomainCoercion,
        f: impl FnOnce(&mut RegionScope<'_>) -> R,
    ) -> R {
        let mut scope = self.scope();
        scope.coerce_domains(coercion);
        f(&mut scope)
    }
}

impl Drop for ConstraintModel {
    fn drop(&mut self) {
        if let Some(artifacts) = &self.artifacts {
            if !self.keep_artifacts {
                artifacts.remove();
            }
        }
    }
}

fn modified(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|err| ModelError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionfit_core::RegionError;
    use regionfit_test::lp::{AUXILIARY_LP, TRIANGLE_LP};

    #[test]
    fn test_all_declared_has_evaluator() {
        let model = ConstraintModel::from_lp_str(TRIANGLE_LP, None).unwrap();
        assert!(!model.has_auxiliary_variables());
        assert_eq!(model.columns(), &["x".to_string(), "y".to_string()]);
        let evaluator = model.evaluator().unwrap();
        assert_eq!(evaluator.evaluate(&[vec![1.0, 1.0], vec![2.0, 1.0]]), vec![true, false]);
    }

    #[test]
    fn test_auxiliary_variables_detected() {
        let declared = vec!["x".to_string(), "y".to_string()];
        let model = ConstraintModel::from_lp_str(AUXILIARY_LP, Some(&declared)).unwrap();
        assert!(model.has_auxiliary_variables());
        assert!(model.evaluator().is_none());
        assert_eq!(model.declared(), &[0, 1]);
        assert_eq!(model.project(&[1.0, 2.0, 0.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_unbounded_declared_variable_rejected() {
        let err = ConstraintModel::from_lp_str(AUXILIARY_LP, None).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Region(RegionError::UnboundedVariable(ref name)) if name == "slack"
        ));
    }

    #[test]
    fn test_missing_declared_names_are_skipped() {
        let declared = vec!["x".to_string(), "ghost".to_string()];
        let model = ConstraintModel::from_lp_str(TRIANGLE_LP, Some(&declared)).unwrap();
        assert_eq!(model.columns(), &["x".to_string()]);
        assert!(model.has_auxiliary_variables());
    }

    #[test]
    fn test_objective_padded() {
        let model =
            ConstraintModel::new(regionfit_test::triangle_grid(), Objective::maximize(vec![1.0]))
                .unwrap();
        assert_eq!(model.objective().coefficients(), &[1.0, 0.0]);
    }
}
