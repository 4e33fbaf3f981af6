//! One MILP solve through `good_lp`'s HiGHS backend.
//!
//! The region's own bounds are replaced by `lower`/`upper`, which is how the
//! pool search hands tightened subproblems to the solver.

use good_lp::{
    constraint, highs, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use regionfit_core::{Objective, Region, Relation, Sense};

use crate::deadline::Deadline;
use crate::error::{OracleError, Result};
use crate::OracleSettings;

/// Result of one subproblem solve.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MilpOutcome {
    Optimal(Vec<f64>),
    Infeasible,
    Unbounded,
}

/// The region's bounds, with integer bounds rounded inwards.
pub(crate) fn root_bounds(region: &Region) -> (Vec<f64>, Vec<f64>) {
    region
        .variables()
        .iter()
        .map(|v| {
            if v.is_integer() {
                (v.lower().ceil(), v.upper().floor())
            } else {
                (v.lower(), v.upper())
            }
        })
        .unzip()
}

pub(crate) fn check_objective(region: &Region, objective: &Objective) -> Result<()> {
    let dimension = region.dimension();
    let len = objective.coefficients().len();
    if len != dimension {
        return Err(OracleError::Malformed(format!(
            "objective has {len} coefficients for {dimension} variables"
        )));
    }
    Ok(())
}

/// Optimizes `objective` over `region` with its bounds replaced by
/// `lower`/`upper`, honoring integer domains.
///
/// Integer coordinates of the returned point are rounded and every
/// coordinate is clamped into its bounds.
pub(crate) fn solve(
    region: &Region,
    lower: &[f64],
    upper: &[f64],
    objective: &Objective,
    settings: &OracleSettings,
    deadline: &Deadline,
) -> Result<MilpOutcome> {
    match solve_once(region, lower, upper, objective, settings, deadline)? {
        // HiGHS may report an unbounded problem as infeasible after presolve
        MilpOutcome::Infeasible if objective.coefficients().iter().any(|&c| c != 0.0) => {
            let zero = Objective::zero(region.dimension());
            Ok(match solve_once(region, lower, upper, &zero, settings, deadline)? {
                MilpOutcome::Optimal(_) => MilpOutcome::Unbounded,
                other => other,
            })
        }
        outcome => Ok(outcome),
    }
}

fn solve_once(
    region: &Region,
    lower: &[f64],
    upper: &[f64],
    objective: &Objective,
    settings: &OracleSettings,
    deadline: &Deadline,
) -> Result<MilpOutcome> {
    deadline.check()?;
    if lower.iter().zip(upper).any(|(l, u)| l > u) {
        return Ok(MilpOutcome::Infeasible);
    }
    if region.dimension() == 0 {
        return Ok(if region.is_satisfied(&[], settings.tolerance) {
            MilpOutcome::Optimal(Vec::new())
        } else {
            MilpOutcome::Infeasible
        });
    }

    let mut problem = ProblemVariables::new();
    let columns: Vec<Variable> = region
        .variables()
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(v, (&l, &u))| {
            let mut definition = variable();
            if l.is_finite() {
                definition = definition.min(l);
            }
            if u.is_finite() {
                definition = definition.max(u);
            }
            if v.is_integer() {
                definition = definition.integer();
            }
            problem.add(definition)
        })
        .collect();

    let goal = linear(&columns, objective.coefficients().iter().copied().enumerate());
    let unsolved = match objective.sense() {
        Sense::Maximize => problem.maximise(goal),
        Sense::Minimize => problem.minimise(goal),
    };
    let mut model = unsolved
        .using(highs)
        .set_time_limit(deadline.remaining().as_secs_f64())
        .set_threads(settings.threads as u32);
    model.set_verbose(false);
    for row in region.constraints() {
        let activity = linear(&columns, row.terms().iter().copied());
        model = model.with(match row.relation() {
            Relation::LessEq => constraint::leq(activity, row.rhs()),
            Relation::GreaterEq => constraint::geq(activity, row.rhs()),
            Relation::Equal => constraint::eq(activity, row.rhs()),
        });
    }

    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => return Ok(MilpOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => return Ok(MilpOutcome::Unbounded),
        Err(other) => {
            deadline.check()?;
            return Err(OracleError::Backend(other.to_string()));
        }
    };
    // HiGHS stops at its own time limit with whatever it has
    deadline.check()?;

    let point = columns
        .iter()
        .zip(region.variables())
        .zip(lower.iter().zip(upper))
        .map(|((&column, v), (&l, &u))| {
            let value = solution.value(column);
            let value = if v.is_integer() { value.round() } else { value };
            value.max(l).min(u) + 0.0
        })
        .collect();
    Ok(MilpOutcome::Optimal(point))
}

fn linear(columns: &[Variable], terms: impl Iterator<Item = (usize, f64)>) -> Expression {
    terms
        .filter(|&(_, a)| a != 0.0)
        .map(|(j, a)| a * columns[j])
        .sum()
}
