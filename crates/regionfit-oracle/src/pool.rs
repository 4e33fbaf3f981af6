//! Best-first solution pool over disjoint subproblems.
//!
//! Every subproblem is a MILP solved by HiGHS. Once a subproblem's optimum
//! is emitted, the rest of that subproblem is split into children that
//! exclude the emitted point's values on the distinguishing columns, so no
//! combination of those values comes out twice.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use regionfit_core::{Objective, Region, Sense};
use tracing::debug;

use crate::deadline::Deadline;
use crate::error::{OracleError, Result};
use crate::highs::{self, MilpOutcome};
use crate::OracleSettings;

/// A subproblem with its optimum.
#[derive(Debug)]
struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
    score: f64,
    point: Vec<f64>,
    seq: u64,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Better score first; on ties the node created earlier wins.
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One `enumerate_pool` call's search state.
pub(crate) struct PoolSearch<'a> {
    region: &'a Region,
    objective: &'a Objective,
    settings: &'a OracleSettings,
    deadline: Deadline,
    /// Integer columns the pool is distinct on, ascending.
    distinct: Vec<usize>,
    solves: usize,
    seq: u64,
}

impl<'a> PoolSearch<'a> {
    pub(crate) fn new(
        region: &'a Region,
        objective: &'a Objective,
        settings: &'a OracleSettings,
        distinct: &[usize],
    ) -> Result<Self> {
        highs::check_objective(region, objective)?;
        if let Some(&bad) = distinct.iter().find(|&&j| j >= region.dimension()) {
            return Err(OracleError::Malformed(format!(
                "distinct column {bad} out of range for {} variables",
                region.dimension()
            )));
        }
        let mut columns: Vec<usize> = distinct
            .iter()
            .copied()
            .filter(|&j| region.variable(j).is_integer())
            .collect();
        columns.sort_unstable();
        columns.dedup();
        Ok(Self {
            region,
            objective,
            settings,
            deadline: Deadline::after(settings.time_limit),
            distinct: columns,
            solves: 0,
            seq: 0,
        })
    }

    /// Up to `max_count` points in non-increasing objective order.
    ///
    /// Stops early, without error, once the node budget is spent.
    pub(crate) fn run(mut self, max_count: usize) -> Result<Vec<Vec<f64>>> {
        let mut found = Vec::new();
        if max_count == 0 {
            return Ok(found);
        }

        let mut heap = BinaryHeap::new();
        let (lower, upper) = highs::root_bounds(self.region);
        if !self.push(&mut heap, lower, upper)? {
            return Ok(self.finish(found, false));
        }

        let mut truncated = false;
        while let Some(node) = heap.pop() {
            found.push(node.point.clone());
            if found.len() >= max_count {
                break;
            }
            if !self.partition(&mut heap, &node)? {
                truncated = true;
                break;
            }
        }
        Ok(self.finish(found, truncated))
    }

    /// Queues the children covering `node` minus the emitted point's
    /// distinct values. `false` once the node budget runs out.
    fn partition(&mut self, heap: &mut BinaryHeap<Node>, node: &Node) -> Result<bool> {
        let mut lower = node.lower.clone();
        let mut upper = node.upper.clone();
        for j in self.distinct.clone() {
            if node.lower[j] >= node.upper[j] {
                continue;
            }
            let v = node.point[j];
            if v - 1.0 >= node.lower[j] {
                let mut below = upper.clone();
                below[j] = v - 1.0;
                if !self.push(heap, lower.clone(), below)? {
                    return Ok(false);
                }
            }
            if v + 1.0 <= node.upper[j] {
                let mut above = lower.clone();
                above[j] = v + 1.0;
                if !self.push(heap, above, upper.clone())? {
                    return Ok(false);
                }
            }
            lower[j] = v;
            upper[j] = v;
        }
        Ok(true)
    }

    /// Solves a subproblem and queues it if it has an optimum. `false` when
    /// the node budget was already spent.
    fn push(&mut self, heap: &mut BinaryHeap<Node>, lower: Vec<f64>, upper: Vec<f64>) -> Result<bool> {
        if self.solves >= self.settings.node_limit {
            return Ok(false);
        }
        self.solves += 1;
        let outcome = highs::solve(
            self.region,
            &lower,
            &upper,
            self.objective,
            self.settings,
            &self.deadline,
        )?;
        if let MilpOutcome::Optimal(point) = outcome {
            let value = self.objective.value(&point);
            let score = match self.objective.sense() {
                Sense::Maximize => value,
                Sense::Minimize => -value,
            };
            self.seq += 1;
            heap.push(Node {
                lower,
                upper,
                score,
                point,
                seq: self.seq,
            });
        }
        Ok(true)
    }

    fn finish(&self, found: Vec<Vec<f64>>, truncated: bool) -> Vec<Vec<f64>> {
        if truncated {
            debug!(
                event = "pool_truncated",
                node_limit = self.settings.node_limit,
                found = found.len(),
            );
        }
        if self.settings.log_to_console {
            debug!(
                event = "oracle_call",
                call = "enumerate_pool",
                solves = self.solves,
                found = found.len(),
                elapsed_ms = self.deadline.elapsed().as_millis() as u64,
            );
        }
        found
    }
}
