//! Fault injection for oracle-level error paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use regionfit_core::{Objective, Region};
use regionfit_oracle::{OracleError, Optimum, Result, SolverOracle};

/// Delegates to `inner` for the first `healthy_calls` calls, then fails every
/// call with [`OracleError::Timeout`].
///
/// # Example
///
/// ```
/// use regionfit_core::{Objective, Region};
/// use regionfit_oracle::{HighsOracle, SolverOracle};
/// use regionfit_test::FlakyOracle;
///
/// let oracle = FlakyOracle::new(HighsOracle::default(), 1);
/// let region = Region::new();
/// assert!(oracle.check_feasible(&region).is_ok());
/// assert!(oracle.check_feasible(&region).is_err());
/// assert_eq!(oracle.calls(), 2);
/// ```
#[derive(Debug)]
pub struct FlakyOracle<O> {
    inner: O,
    healthy_calls: usize,
    calls: AtomicUsize,
}

impl<O: SolverOracle> FlakyOracle<O> {
    pub fn new(inner: O, healthy_calls: usize) -> Self {
        Self {
            inner,
            healthy_calls,
            calls: AtomicUsize::new(0),
        }
    }

    /// Total calls seen so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn admit(&self) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.healthy_calls {
            Err(OracleError::Timeout {
                limit: Duration::ZERO,
            })
        } else {
            Ok(())
        }
    }
}

impl<O: SolverOracle> SolverOracle for FlakyOracle<O> {
    fn optimize(&self, region: &Region, objective: &Objective) -> Result<Optimum> {
        self.admit()?;
        self.inner.optimize(region, objective)
    }

    fn enumerate_pool(
        &self,
        region: &Region,
        objective: &Objective,
        max_count: usize,
        distinct: &[usize],
    ) -> Result<Vec<Vec<f64>>> {
        self.admit()?;
        self.inner.enumerate_pool(region, objective, max_count, distinct)
    }

    fn check_feasible(&self, region: &Region) -> Result<bool> {
        self.admit()?;
        self.inner.check_feasible(region)
    }
}
