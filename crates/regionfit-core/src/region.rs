//! Linear regions: variables plus linear constraints.

use std::collections::HashMap;
use std::fmt;

use crate::domain::Variable;
use crate::error::{RegionError, Result};

/// Comparison between a constraint's activity and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    LessEq,
    GreaterEq,
    Equal,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::LessEq => write!(f, "<="),
            Relation::GreaterEq => write!(f, ">="),
            Relation::Equal => write!(f, "="),
        }
    }
}

/// A constraint `Σ a_j x_j {<=, >=, =} rhs` over region variable indices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearConstraint {
    name: Option<String>,
    terms: Vec<(usize, f64)>,
    relation: Relation,
    rhs: f64,
}

impl LinearConstraint {
    pub fn new(terms: Vec<(usize, f64)>, relation: Relation, rhs: f64) -> Self {
        Self {
            name: None,
            terms,
            relation,
            rhs,
        }
    }

    pub fn named(
        name: impl Into<String>,
        terms: Vec<(usize, f64)>,
        relation: Relation,
        rhs: f64,
    ) -> Self {
        Self {
            name: Some(name.into()),
            terms,
            relation,
            rhs,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Left-hand side value `Σ a_j x_j` at `point`.
    pub fn activity(&self, point: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(idx, coef)| coef * point[idx])
            .sum()
    }

    pub fn is_satisfied(&self, point: &[f64], tolerance: f64) -> bool {
        let lhs = self.activity(point);
        match self.relation {
            Relation::LessEq => lhs <= self.rhs + tolerance,
            Relation::GreaterEq => lhs >= self.rhs - tolerance,
            Relation::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    pub fn flipped(self) -> Self {
        match self {
            Sense::Minimize => Sense::Maximize,
            Sense::Maximize => Sense::Minimize,
        }
    }
}

/// A linear objective over all variables of a region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    coefficients: Vec<f64>,
    sense: Sense,
}

impl Objective {
    pub fn new(coefficients: Vec<f64>, sense: Sense) -> Self {
        Self {
            coefficients,
            sense,
        }
    }

    pub fn minimize(coefficients: Vec<f64>) -> Self {
        Self::new(coefficients, Sense::Minimize)
    }

    pub fn maximize(coefficients: Vec<f64>) -> Self {
        Self::new(coefficients, Sense::Maximize)
    }

    /// The constant objective: every feasible point is optimal.
    pub fn zero(dimension: usize) -> Self {
        Self::minimize(vec![0.0; dimension])
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn value(&self, point: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(point)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Same coefficients, opposite sense.
    pub fn flipped(&self) -> Self {
        Self::new(self.coefficients.clone(), self.sense.flipped())
    }

    /// Copy padded with zeros (or truncated) to `dimension` coefficients.
    pub fn resized(&self, dimension: usize) -> Self {
        let mut coefficients = self.coefficients.clone();
        coefficients.resize(dimension, 0.0);
        Self::new(coefficients, self.sense)
    }
}

/// Variables in declaration order plus the linear constraints over them.
///
/// # Example
///
/// ```
/// use regionfit_core::{Region, Relation, Variable};
///
/// let mut region = Region::new();
/// region.add_variable(Variable::integer("x", 0.0, 2.0).unwrap()).unwrap();
/// region.add_variable(Variable::integer("y", 0.0, 2.0).unwrap()).unwrap();
/// region
///     .add_named_constraint(Some("c1"), &[("x", 1.0), ("y", 1.0)], Relation::LessEq, 2.0)
///     .unwrap();
///
/// assert!(region.is_satisfied(&[1.0, 1.0], 1e-9));
/// assert!(!region.is_satisfied(&[2.0, 1.0], 1e-9));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
    constraints: Vec<LinearConstraint>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variable and returns its index.
    pub fn add_variable(&mut self, variable: Variable) -> Result<usize> {
        if self.index.contains_key(variable.name()) {
            return Err(RegionError::DuplicateVariable(variable.name().to_string()));
        }
        let idx = self.variables.len();
        self.index.insert(variable.name().to_string(), idx);
        self.variables.push(variable);
        Ok(idx)
    }

    /// Appends a constraint whose terms reference existing variable indices.
    pub fn add_constraint(&mut self, constraint: LinearConstraint) -> Result<()> {
        let dimension = self.variables.len();
        if let Some(&(idx, _)) = constraint.terms().iter().find(|(idx, _)| *idx >= dimension) {
            return Err(RegionError::UnknownVariable(format!("#{idx}")));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Appends a constraint written with variable names.
    pub fn add_named_constraint(
        &mut self,
        name: Option<&str>,
        terms: &[(&str, f64)],
        relation: Relation,
        rhs: f64,
    ) -> Result<()> {
        let terms = terms
            .iter()
            .map(|(var, coef)| self.require_index(var).map(|idx| (idx, *coef)))
            .collect::<Result<Vec<_>>>()?;
        let constraint = match name {
            Some(name) => LinearConstraint::named(name, terms, relation, rhs),
            None => LinearConstraint::new(terms, relation, rhs),
        };
        self.add_constraint(constraint)
    }

    pub fn dimension(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, idx: usize) -> &Variable {
        &self.variables[idx]
    }

    pub fn variable_mut(&mut self, idx: usize) -> &mut Variable {
        &mut self.variables[idx]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn require_index(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| RegionError::UnknownVariable(name.to_string()))
    }

    /// Whether any variable has an integer domain.
    pub fn has_integer_variables(&self) -> bool {
        self.variables.iter().any(Variable::is_integer)
    }

    /// Checks bounds, integrality and every constraint at `point`.
    pub fn is_satisfied(&self, point: &[f64], tolerance: f64) -> bool {
        point.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(point)
                .all(|(var, &value)| var.contains(value, tolerance))
            && self
                .constraints
                .iter()
                .all(|c| c.is_satisfied(point, tolerance))
    }

    /// Drops variables and constraints appended after the given counts.
    pub fn truncate(&mut self, variable_count: usize, constraint_count: usize) {
        for removed in self.variables.drain(variable_count.min(self.variables.len())..) {
            self.index.remove(removed.name());
        }
        self.constraints.truncate(constraint_count);
    }
}
