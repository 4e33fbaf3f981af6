//! Variable definitions.

use std::fmt;

use crate::error::{RegionError, Result};

/// The kind of values a variable may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DomainKind {
    /// Whole numbers within the bounds.
    Integer,
    /// Any real number within the bounds.
    #[default]
    Real,
}

impl DomainKind {
    pub fn is_integer(self) -> bool {
        matches!(self, DomainKind::Integer)
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainKind::Integer => write!(f, "Z"),
            DomainKind::Real => write!(f, "R"),
        }
    }
}

/// A named, bounded coordinate of a region.
///
/// Bounds are inclusive. They may be infinite only for auxiliary variables
/// introduced by compilation; declared model variables are checked with
/// [`Variable::require_finite`].
///
/// # Example
///
/// ```
/// use regionfit_core::{DomainKind, Variable};
///
/// let x = Variable::integer("x", 0.0, 2.0).unwrap();
/// assert_eq!(x.kind(), DomainKind::Integer);
/// assert_eq!(x.measure(), 3.0);
/// assert!(x.contains(1.0, 1e-9));
/// assert!(!x.contains(1.5, 1e-9));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    name: String,
    kind: DomainKind,
    lower: f64,
    upper: f64,
}

impl Variable {
    /// Creates a variable, validating its bounds.
    pub fn new(name: impl Into<String>, kind: DomainKind, lower: f64, upper: f64) -> Result<Self> {
        let name = name.into();
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(RegionError::InvalidBounds { name, lower, upper });
        }
        Ok(Self {
            name,
            kind,
            lower,
            upper,
        })
    }

    pub fn integer(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self> {
        Self::new(name, DomainKind::Integer, lower, upper)
    }

    pub fn real(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self> {
        Self::new(name, DomainKind::Real, lower, upper)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DomainKind {
        self.kind
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn is_integer(&self) -> bool {
        self.kind.is_integer()
    }

    /// Changes the domain kind. Used by scoped relaxations.
    pub fn set_kind(&mut self, kind: DomainKind) {
        self.kind = kind;
    }

    /// Replaces both bounds. Used by scoped relaxations and pinning.
    pub fn set_bounds(&mut self, lower: f64, upper: f64) -> Result<()> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(RegionError::InvalidBounds {
                name: self.name.clone(),
                lower,
                upper,
            });
        }
        self.lower = lower;
        self.upper = upper;
        Ok(())
    }

    /// Fails with [`RegionError::UnboundedVariable`] if either bound is infinite.
    pub fn require_finite(&self) -> Result<()> {
        if self.lower.is_finite() && self.upper.is_finite() {
            Ok(())
        } else {
            Err(RegionError::UnboundedVariable(self.name.clone()))
        }
    }

    /// Whole-number range `[ceil(lower), floor(upper)]` of an integer domain.
    ///
    /// Returns `None` when the range holds no integer or is unbounded.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return None;
        }
        let lo = self.lower.ceil();
        let hi = self.upper.floor();
        if lo > hi {
            None
        } else {
            Some((lo as i64, hi as i64))
        }
    }

    /// Size of the domain along this coordinate.
    ///
    /// Integer domains count their whole numbers, real domains measure their
    /// length. A zero-width real domain is a fixed coordinate and measures 1
    /// so that it does not zero out box volumes.
    pub fn measure(&self) -> f64 {
        Self::measure_of(self.kind, self.lower, self.upper)
    }

    /// Measure of an arbitrary sub-interval under the given domain kind.
    pub fn measure_of(kind: DomainKind, lower: f64, upper: f64) -> f64 {
        if upper < lower {
            return 0.0;
        }
        match kind {
            DomainKind::Integer => {
                let count = upper.floor() - lower.ceil() + 1.0;
                count.max(0.0)
            }
            DomainKind::Real => {
                let width = upper - lower;
                if width == 0.0 {
                    1.0
                } else {
                    width
                }
            }
        }
    }

    /// Whether `value` lies within the bounds (and is integral for integer
    /// domains), up to `tolerance`.
    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        if value.is_nan() || value < self.lower - tolerance || value > self.upper + tolerance {
            return false;
        }
        !self.is_integer() || (value - value.round()).abs() <= tolerance
    }

    /// Clamps `value` into the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {}[{}, {}]",
            self.name, self.kind, self.lower, self.upper
        )
    }
}
