//! Wall-clock ceiling for a single solver call.

use std::time::{Duration, Instant};

use crate::error::{OracleError, Result};

/// Tracks the time spent by one oracle call.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use regionfit_oracle::Deadline;
///
/// let deadline = Deadline::after(Duration::from_secs(600));
/// assert!(deadline.check().is_ok());
///
/// let expired = Deadline::after(Duration::ZERO);
/// assert!(expired.check().is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn after(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Time left before the limit, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.start.elapsed())
    }

    /// Fails with [`OracleError::Timeout`] once the limit has passed.
    pub fn check(&self) -> Result<()> {
        if self.start.elapsed() >= self.limit {
            Err(OracleError::Timeout { limit: self.limit })
        } else {
            Ok(())
        }
    }
}
