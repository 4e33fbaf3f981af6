//! RegionFit Core - Core types for constraint-region sampling
//!
//! This crate provides the fundamental abstractions shared by every RegionFit
//! component:
//! - Variables and their domains (integer or real, bounded)
//! - Linear constraints, objectives and regions
//! - Sample sets (fixed-width tables of unique points) with CSV I/O

pub mod domain;
pub mod error;
pub mod region;
pub mod sample;

pub use domain::{DomainKind, Variable};
pub use error::{RegionError, Result};
pub use region::{LinearConstraint, Objective, Region, Relation, Sense};
pub use sample::SampleSet;

/// Default absolute tolerance used when checking constraints and integrality.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;
