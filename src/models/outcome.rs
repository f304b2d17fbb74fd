//! Outcome models
//!
//! Per-test results and the run summary built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::TestDescriptor;
use crate::error::{ErrorKind, ForgeError};

/// Outcome status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Pass,
    Fail,
}

impl OutcomeStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            OutcomeStatus::Pass => "✓",
            OutcomeStatus::Fail => "✗",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Pass => write!(f, "PASS"),
            OutcomeStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Error marker carried by a failed outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ForgeError> for OutcomeError {
    fn from(err: &ForgeError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result of executing one endpoint test
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub test: TestDescriptor,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
    pub duration_ms: u64,
}

impl Outcome {
    pub fn pass(test: TestDescriptor, body: Value, duration_ms: u64) -> Self {
        Self {
            test,
            success: true,
            body: Some(body),
            error: None,
            duration_ms,
        }
    }

    pub fn error(test: TestDescriptor, err: &ForgeError, duration_ms: u64) -> Self {
        Self {
            test,
            success: false,
            body: None,
            error: Some(err.into()),
            duration_ms,
        }
    }

    /// Failure that never reached the executor (e.g. a worker that panicked)
    pub fn aborted(test: TestDescriptor, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            test,
            success: false,
            body: None,
            error: Some(OutcomeError {
                kind,
                message: message.into(),
            }),
            duration_ms: 0,
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        if self.success {
            OutcomeStatus::Pass
        } else {
            OutcomeStatus::Fail
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status().symbol(),
            self.test,
            self.duration_ms
        )?;
        if let Some(err) = &self.error {
            write!(f, " - {}: {}", err.kind, err.message)?;
        }
        Ok(())
    }
}

/// Summary of one run over a test plan
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Wall-clock time from `started_at` until the summary was built
    #[serde(default)]
    pub elapsed_ms: u64,
    /// Sum of per-test durations; exceeds `elapsed_ms` on a concurrent run
    pub total_duration_ms: u64,
    pub outcomes: Vec<Outcome>,
}

impl RunSummary {
    pub fn new(base_url: impl Into<String>, started_at: DateTime<Utc>, outcomes: Vec<Outcome>) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.success).count();
        let total_duration_ms = outcomes.iter().map(|o| o.duration_ms).sum();
        let elapsed_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;

        Self {
            base_url: base_url.into(),
            started_at,
            total,
            passed,
            failed: total - passed,
            elapsed_ms,
            total_duration_ms,
            outcomes,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// One-line form used for run-end reporting
    pub fn headline(&self) -> String {
        format!(
            "{}/{} passed ({:.1}%) against {} in {}ms ({}ms test time)",
            self.passed,
            self.total,
            self.pass_rate(),
            self.base_url,
            self.elapsed_ms,
            self.total_duration_ms
        )
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run against {}", self.base_url)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for outcome in &self.outcomes {
            writeln!(f, "  {outcome}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {}",
            self.total, self.passed, self.failed
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Elapsed: {}ms | Test time: {}ms",
            self.pass_rate(),
            self.elapsed_ms,
            self.total_duration_ms
        )
    }
}
