//! Parallel test execution
//!
//! Runs a plan's tests on a bounded pool of worker tasks and returns the
//! outcomes in submission order.

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::TestRunner;
use crate::error::ErrorKind;
use crate::models::{EndpointTest, Outcome, RunSummary};

/// Parallel test executor
pub struct ParallelExecutor {
    max_concurrent: usize,
}

impl ParallelExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run tests concurrently, at most `max_concurrent` in flight
    ///
    /// The returned outcomes line up index-for-index with `tests`,
    /// whichever worker finishes first.
    pub async fn run_tests_parallel(
        &self,
        runner: Arc<TestRunner>,
        tests: Vec<EndpointTest>,
    ) -> Vec<Outcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut descriptors = Vec::with_capacity(tests.len());
        let mut handles = Vec::with_capacity(tests.len());

        for (index, test) in tests.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let runner = runner.clone();
            descriptors.push(test.descriptor());

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return Outcome::aborted(test.descriptor(), ErrorKind::Network, e.to_string())
                    }
                };

                debug!("Starting parallel execution of #{} {}", index, test);
                runner.execute(&test).await
            });

            handles.push(handle);
        }

        join_all(handles)
            .await
            .into_iter()
            .zip(descriptors)
            .map(|(joined, descriptor)| match joined {
                Ok(outcome) => outcome,
                Err(e) => Outcome::aborted(
                    descriptor,
                    ErrorKind::Network,
                    format!("worker task did not complete: {e}"),
                ),
            })
            .collect()
    }

    /// Run all tests in parallel with run-start, per-outcome and summary
    /// reporting
    pub async fn run_all_parallel(
        &self,
        runner: Arc<TestRunner>,
        tests: Vec<EndpointTest>,
    ) -> RunSummary {
        let started_at = Utc::now();
        let start = Instant::now();
        runner.report_start(
            tests.len(),
            &format!("in parallel (max {} concurrent)", self.max_concurrent),
        );

        let outcomes = self.run_tests_parallel(runner.clone(), tests).await;
        for outcome in &outcomes {
            info!("  {}", outcome);
            runner.report(outcome);
        }

        let summary = RunSummary::new(runner.base_url(), started_at, outcomes);

        info!(
            "Parallel execution completed in {}ms - Pass: {}/{} ({:.1}%)",
            start.elapsed().as_millis(),
            summary.passed,
            summary.total,
            summary.pass_rate()
        );
        runner.report_summary(&summary);

        summary
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(10)
    }
}
