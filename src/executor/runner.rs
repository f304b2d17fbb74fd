//! Test execution runner
//!
//! Runs endpoint tests one after another and owns the per-test procedure
//! shared with the parallel executor.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::{render_param, RequestExecutor, RequestExtra, RetryPolicy};
use crate::error::{ForgeError, ForgeResult};
use crate::http::Transport;
use crate::models::{EndpointTest, HttpMethod, Outcome, RunSummary, TestPlan};
use crate::report::Reporter;
use crate::utils::Timer;
use crate::validator;

const SOURCE: &str = "TestRunner";

/// Substitute `{name}` placeholders from `params`
///
/// Returns the formatted path and the parameters left for the query string.
/// Placeholders without a matching parameter stay in the path as written.
pub fn format_path(path: &str, params: &Map<String, Value>) -> (String, Map<String, Value>) {
    let mut formatted = path.to_string();
    let mut query = Map::new();

    for (name, value) in params {
        let placeholder = format!("{{{name}}}");
        if formatted.contains(&placeholder) {
            formatted = formatted.replace(&placeholder, &render_param(value));
        } else {
            query.insert(name.clone(), value.clone());
        }
    }

    (formatted, query)
}

/// Join a base URL and an endpoint path with exactly one slash
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Test runner for a single base URL
pub struct TestRunner {
    executor: RequestExecutor,
    base_url: String,
    reporter: Option<Arc<dyn Reporter>>,
}

impl TestRunner {
    /// Create a new test runner
    pub fn new(executor: RequestExecutor, base_url: impl Into<String>) -> Self {
        Self {
            executor,
            base_url: base_url.into(),
            reporter: None,
        }
    }

    /// Runner for a compiled plan, applying the plan's auth policy
    pub fn for_plan(plan: &TestPlan, transport: Arc<dyn Transport>) -> Self {
        Self::new(
            RequestExecutor::new(transport, plan.auth.clone()),
            plan.base_url.clone(),
        )
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.executor = self.executor.with_retry(retry);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a single test and return its parsed body
    pub async fn run_test(&self, test: &EndpointTest) -> ForgeResult<Value> {
        let (path, query) = format_path(&test.path, &test.params);
        let url = join_url(&self.base_url, &path);
        let method: HttpMethod = test.method.parse()?;

        let extra = RequestExtra::new().json(test.payload.clone());
        let body = self
            .executor
            .send(&url, method, &query, test.expected_status, extra)
            .await?;

        validator::check(&body, &test.expected_keys).map_err(ForgeError::Validation)?;

        Ok(body)
    }

    /// Run a single test, converting any failure into an error outcome
    pub async fn execute(&self, test: &EndpointTest) -> Outcome {
        let timer = Timer::start(test.to_string());
        let result = self.run_test(test).await;
        let duration_ms = timer.elapsed_ms();

        match result {
            Ok(body) => Outcome::pass(test.descriptor(), body, duration_ms),
            Err(e) => {
                debug!("Test {} failed with error: {}", test, e);
                Outcome::error(test.descriptor(), &e, duration_ms)
            }
        }
    }

    /// Forward an outcome to the reporter, if any
    pub(crate) fn report(&self, outcome: &Outcome) {
        if let Some(reporter) = &self.reporter {
            reporter.log_result(
                &outcome.test,
                outcome.body.as_ref(),
                outcome.success,
                outcome.error.as_ref().map(|e| e.message.as_str()),
            );
        }
    }

    pub(crate) fn report_start(&self, count: usize, mode: &str) {
        let message = format!(
            "Running {} tests {} against {}",
            count, mode, self.base_url
        );
        info!("{}", message);
        if let Some(reporter) = &self.reporter {
            reporter.log_info(SOURCE, &message);
        }
    }

    pub(crate) fn report_summary(&self, summary: &RunSummary) {
        info!("Run completed - {}", summary.headline());
        if let Some(reporter) = &self.reporter {
            if summary.is_all_passed() {
                reporter.log_info(SOURCE, &summary.headline());
            } else {
                reporter.log_error(SOURCE, &summary.headline());
            }
        }
    }

    /// Run tests sequentially; failures never abort the batch
    pub async fn run_all(&self, tests: &[EndpointTest]) -> RunSummary {
        let started_at = Utc::now();
        self.report_start(tests.len(), "sequentially");

        let mut outcomes = Vec::with_capacity(tests.len());
        for test in tests {
            let outcome = self.execute(test).await;
            info!("  {}", outcome);
            self.report(&outcome);
            outcomes.push(outcome);
        }

        let summary = RunSummary::new(&self.base_url, started_at, outcomes);
        self.report_summary(&summary);
        summary
    }
}
