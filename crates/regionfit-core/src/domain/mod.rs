//! Variable domains.
//!
//! A [`Variable`] is a named, bounded coordinate of a region. Its
//! [`DomainKind`] decides whether points must take whole-number values on it.

mod variable;

#[cfg(test)]
mod tests;

pub use variable::{DomainKind, Variable};
