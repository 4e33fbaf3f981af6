//! Reference tables in CSV form.

/// Ten distinct rows for [`crate::regions::staircase`]`(3.0)`, seven of them
/// feasible.
pub const STAIRCASE_MIXED_CSV: &str = "x,y
0,0
0,1
0,2
0,3
1,0
1,1
1,2
2,2
3,1
9,9
";

/// Every lattice point of the triangle, labelled with a `class` column.
pub const TRIANGLE_LABELLED_CSV: &str = "x,y,class
0,0,true
0,1,true
0,2,true
1,0,true
1,1,true
2,0,true
";

/// A reference table with one row labelled infeasible.
pub const TRIANGLE_NEGATIVE_CSV: &str = "x,y,class
0,0,true
2,2,false
";
