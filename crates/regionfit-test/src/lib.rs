//! Shared test fixtures for RegionFit crates.
//!
//! - [`regions`] - canonical regions for the sampling scenarios
//! - [`lp`] - the same regions as LP-format artifacts
//! - [`data`] - reference CSV tables
//! - [`oracle`] - a fault-injecting [`SolverOracle`](regionfit_oracle::SolverOracle) wrapper
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! regionfit-test = { workspace = true }
//! ```

pub mod data;
pub mod lp;
pub mod oracle;
pub mod regions;

pub use oracle::FlakyOracle;
pub use regions::{infeasible_interval, integer_box, triangle_grid, unit_square};
