//! Scoped, self-restoring edits of a model's region.

use regionfit_core::{DomainKind, LinearConstraint, Region, Variable};
use tracing::trace;

use crate::error::Result;
use crate::model::ConstraintModel;

/// Domain rewrite applied to every variable of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainCoercion {
    AllInteger,
    AllContinuous,
}

impl DomainCoercion {
    fn kind(self) -> DomainKind {
        match self {
            DomainCoercion::AllInteger => DomainKind::Integer,
            DomainCoercion::AllContinuous => DomainKind::Real,
        }
    }
}

/// Temporary edits to a model's region.
///
/// On drop the region returns to the exact state it had when the scope was
/// opened: variable kinds and bounds are restored bit-for-bit, appended
/// variables and constraints are removed. This holds on every exit path,
/// including `?` returns and unwinding.
///
/// # Example
///
/// ```
/// use regionfit_core::Objective;
/// use regionfit_model::{ConstraintModel, DomainCoercion};
/// use regionfit_test::unit_square;
///
/// let mut model = ConstraintModel::new(unit_square(), Objective::zero(2)).unwrap();
/// let before = model.region().clone();
/// {
///     let mut scope = model.scope();
///     scope.coerce_domains(DomainCoercion::AllInteger);
///     scope.pin(0, 1.0).unwrap();
///     assert!(scope.region().variable(0).is_integer());
/// }
/// assert_eq!(model.region(), &before);
/// ```
#[derive(Debug)]
pub struct RegionScope<'a> {
    model: &'a mut ConstraintModel,
    saved: Vec<Variable>,
    constraint_count: usize,
}

impl<'a> RegionScope<'a> {
    pub(crate) fn new(model: &'a mut ConstraintModel) -> Self {
        let saved = model.region().variables().to_vec();
        let constraint_count = model.region().constraints().len();
        Self {
            model,
            saved,
            constraint_count,
        }
    }

    /// The model as currently edited.
    pub fn model(&self) -> &ConstraintModel {
        self.model
    }

    pub fn region(&self) -> &Region {
        self.model.region()
    }

    pub fn coerce_domains(&mut self, coercion: DomainCoercion) {
        let kind = coercion.kind();
        let region = self.model.region_mut();
        for idx in 0..region.dimension() {
            region.variable_mut(idx).set_kind(kind);
        }
    }

    /// Fixes variable `idx` to `value`.
    pub fn pin(&mut self, idx: usize, value: f64) -> Result<()> {
        self.set_bounds(idx, value, value)
    }

    /// Pins every declared variable to the matching entry of `row`.
    pub fn pin_declared(&mut self, row: &[f64]) -> Result<()> {
        let declared = self.model.declared().to_vec();
        for (idx, &value) in declared.into_iter().zip(row) {
            self.pin(idx, value)?;
        }
        Ok(())
    }

    pub fn set_bounds(&mut self, idx: usize, lower: f64, upper: f64) -> Result<()> {
        self.model
            .region_mut()
            .variable_mut(idx)
            .set_bounds(lower, upper)?;
        Ok(())
    }

    /// Appends a variable and returns its index.
    pub fn add_variable(&mut self, variable: Variable) -> Result<usize> {
        Ok(self.model.region_mut().add_variable(variable)?)
    }

    pub fn add_constraint(&mut self, constraint: LinearConstraint) -> Result<()> {
        Ok(self.model.region_mut().add_constraint(constraint)?)
    }
}

impl Drop for RegionScope<'_> {
    fn drop(&mut self) {
        let saved = std::mem::take(&mut self.saved);
        let region = self.model.region_mut();
        region.truncate(saved.len(), self.constraint_count);
        for (idx, variable) in saved.into_iter().enumerate() {
            *region.variable_mut(idx) = variable;
        }
        trace!(event = "scope_restored", variables = region.dimension());
    }
}
