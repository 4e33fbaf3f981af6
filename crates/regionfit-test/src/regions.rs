//! Canonical regions used across the sampler, volume and fitness tests.
//!
//! # Example
//!
//! ```
//! use regionfit_test::regions::triangle_grid;
//!
//! let region = triangle_grid();
//! assert_eq!(region.dimension(), 2);
//! assert!(region.is_satisfied(&[1.0, 1.0], 1e-9));
//! ```

use regionfit_core::{Region, Relation, Variable};

/// `x, y ∈ {0, 1, 2}` with `x + y <= 2`: exactly six lattice points.
pub fn triangle_grid() -> Region {
    let mut region = integer_box(&["x", "y"], 0.0, 2.0);
    region
        .add_named_constraint(Some("diag"), &[("x", 1.0), ("y", 1.0)], Relation::LessEq, 2.0)
        .expect("fixture variables exist");
    region
}

/// `x, y ∈ [0, 1]` with no further constraints.
pub fn unit_square() -> Region {
    let mut region = Region::new();
    for name in ["x", "y"] {
        region
            .add_variable(Variable::real(name, 0.0, 1.0).expect("valid bounds"))
            .expect("distinct names");
    }
    region
}

/// `x ∈ {0..10}` with `x >= 5` and `x <= 1`.
pub fn infeasible_interval() -> Region {
    let mut region = integer_box(&["x"], 0.0, 10.0);
    region
        .add_named_constraint(Some("low"), &[("x", 1.0)], Relation::GreaterEq, 5.0)
        .expect("fixture variables exist");
    region
        .add_named_constraint(Some("high"), &[("x", 1.0)], Relation::LessEq, 1.0)
        .expect("fixture variables exist");
    region
}

/// Integer variables named `names`, each in `[lower, upper]`.
pub fn integer_box(names: &[&str], lower: f64, upper: f64) -> Region {
    let mut region = Region::new();
    for name in names {
        region
            .add_variable(Variable::integer(*name, lower, upper).expect("valid bounds"))
            .expect("distinct names");
    }
    region
}

/// `x, y ∈ {0..9}` with `x + y <= k`; shrinks towards the origin as `k` drops.
pub fn staircase(k: f64) -> Region {
    let mut region = integer_box(&["x", "y"], 0.0, 9.0);
    region
        .add_named_constraint(Some("stair"), &[("x", 1.0), ("y", 1.0)], Relation::LessEq, k)
        .expect("fixture variables exist");
    region
}
