//! Retry policy
//!
//! Fixed-delay retry bounded both by an attempt count and by a wall-clock
//! deadline measured from the first attempt.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::warn;

/// Retry configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Fixed wait between attempts
    pub delay: Duration,

    /// No new attempt starts once this much time has passed
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            deadline: Duration::from_secs(15),
        }
    }
}

/// The last error of an exhausted or aborted retry sequence
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub attempts: u32,
    pub elapsed: Duration,
    pub error: E,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Never retry
    pub fn none() -> Self {
        Self::default().max_attempts(1)
    }

    /// Run `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or either bound is reached.
    ///
    /// The operation receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        is_retryable: P,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: fmt::Display,
    {
        let start = Instant::now();
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let elapsed = start.elapsed();
            if !is_retryable(&error) || attempt >= max_attempts || elapsed >= self.deadline {
                return Err(RetryFailure {
                    attempts: attempt,
                    elapsed,
                    error,
                });
            }

            warn!(
                "Attempt {}/{} failed: {} (retrying in {}ms)",
                attempt,
                max_attempts,
                error,
                self.delay.as_millis()
            );
            sleep(self.delay).await;
        }
    }
}
