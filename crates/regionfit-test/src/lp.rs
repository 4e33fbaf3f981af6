//! LP-format artifacts matching [`crate::regions`].

/// Same lattice as [`crate::regions::triangle_grid`].
pub const TRIANGLE_LP: &str = "\\ triangle lattice
Minimize
 obj: 0 x + 0 y
Subject To
 diag: x + y <= 2
Bounds
 0 <= x <= 2
 0 <= y <= 2
Generals
 x y
End
";

/// Same box as [`crate::regions::unit_square`].
pub const UNIT_SQUARE_LP: &str = "Maximize
 obj: x + y
Subject To
Bounds
 0 <= x <= 1
 0 <= y <= 1
End
";

/// Same region as [`crate::regions::infeasible_interval`].
pub const INFEASIBLE_LP: &str = "Minimize
 obj: x
Subject To
 low: x >= 5
 high: x <= 1
Bounds
 0 <= x <= 10
General
 x
End
";

/// Two declared integers linked through an unbounded auxiliary `slack`,
/// written the way the compiler splits long rows over several lines.
///
/// Feasible declared points are `x + y <= 3` with both in `{0..3}`.
pub const AUXILIARY_LP: &str = "\\ Problem name: aux.zpl
Minimize
 cost: + 0 x + 0 y
Subject to
 link_1:
  + x + y
  + slack = 3
 nonneg_1: + slack >= 0
Bounds
 0 <= x <= 3
 0 <= y <= 3
 -inf <= slack <= +inf
Generals
 x y
End
";

/// Same lattice as [`crate::regions::staircase`]`(3.0)`.
pub const STAIRCASE_LP: &str = "Minimize
 obj: 0 x
Subject To
 stair: x + y <= 3
Bounds
 0 <= x <= 9
 0 <= y <= 9
Integers
 x y
End
";

/// One declared integer `x` in `{0, 1, 2}` next to an auxiliary integer
/// `t` in `{0, 1}` that every value of `x` can pair with.
pub const AUXILIARY_INTEGER_LP: &str = "\\ Problem name: pick.zpl
Maximize
 obj: + t
Subject To
 cap: + x + t <= 3
Bounds
 0 <= x <= 2
 0 <= t <= 1
Generals
 x t
End
";
