//! Bounded retries for network operations
//!
//! Clone, fetch, push and cache transfers are retried a fixed number of times.
//! Retries are immediate unless a backoff interval is configured; either way
//! an operation fails after exactly [`RetryPolicy::attempts`] tries.

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use backoff::backoff::Backoff;

use crate::{Error, Result};

/// Attempt budget for every retried operation.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    initial_backoff: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            initial_backoff: None,
        }
    }
}

impl RetryPolicy {
    /// Immediate retries with the default attempt budget.
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Exponential backoff starting at `initial` between attempts.
    ///
    /// A zero interval means immediate retries.
    pub fn with_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = (!initial.is_zero()).then_some(initial);
        self
    }

    /// Override the attempt budget. Values below one are raised to one.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The final failure is
    /// returned wrapped in [`Error::RetriesExhausted`].
    pub fn run<T, F>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Result<T>,
    {
        let mut delays = self.initial_backoff.map(|initial| {
            ExponentialBackoffBuilder::new()
                .with_initial_interval(initial)
                .with_max_elapsed_time(None)
                .build()
        });

        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt >= self.attempts => {
                    tracing::error!(
                        operation,
                        attempts = self.attempts,
                        error = %err,
                        "Giving up"
                    );
                    return Err(Error::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: self.attempts,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    tracing::warn!(operation, attempt, error = %err, "Attempt failed, retrying");
                    if let Some(delay) = delays.as_mut().and_then(|b| b.next_backoff()) {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
