//! Reporting sink
//!
//! The orchestrator forwards run-start, per-outcome and run-summary events to
//! an optional [`Reporter`].

use serde_json::Value;
use tracing::{error, info};

use crate::models::TestDescriptor;

/// Receives outcome and log events from a run
///
/// Calls are made synchronously from the orchestrator; implementations
/// should not block for long.
pub trait Reporter: Send + Sync {
    /// Record the outcome of a single test
    fn log_result(
        &self,
        test: &TestDescriptor,
        result: Option<&Value>,
        success: bool,
        error: Option<&str>,
    );

    /// Free-form informational message
    fn log_info(&self, source: &str, message: &str);

    /// Error message
    fn log_error(&self, source: &str, message: &str);
}

/// Reporter that writes events through `tracing`
#[derive(Clone, Debug, Default)]
pub struct TracingReporter {
    /// Include response bodies in passing results
    show_bodies: bool,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bodies(mut self) -> Self {
        self.show_bodies = true;
        self
    }
}

impl Reporter for TracingReporter {
    fn log_result(
        &self,
        test: &TestDescriptor,
        result: Option<&Value>,
        success: bool,
        error: Option<&str>,
    ) {
        let status = if success { "PASS" } else { "FAIL" };
        match (error, result) {
            (Some(err), _) => error!("Test {}: {} - {}", test, status, err),
            (None, Some(body)) if self.show_bodies => {
                info!("Test {}: {} - Result: {}", test, status, body)
            }
            _ => info!("Test {}: {}", test, status),
        }
    }

    fn log_info(&self, source: &str, message: &str) {
        info!("[{}] {}", source, message);
    }

    fn log_error(&self, source: &str, message: &str) {
        error!("[{}] {}", source, message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// One recorded reporter call
    #[derive(Clone, Debug, PartialEq)]
    pub enum Event {
        Result {
            test: String,
            success: bool,
            error: Option<String>,
        },
        Info(String, String),
        Error(String, String),
    }

    /// Reporter that keeps every event in memory
    #[derive(Default)]
    pub struct RecordingReporter {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingReporter {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub fn results(&self) -> Vec<(String, bool)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Result { test, success, .. } => Some((test, success)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Reporter for RecordingReporter {
        fn log_result(
            &self,
            test: &TestDescriptor,
            _result: Option<&Value>,
            success: bool,
            error: Option<&str>,
        ) {
            self.events.lock().unwrap().push(Event::Result {
                test: test.to_string(),
                success,
                error: error.map(str::to_string),
            });
        }

        fn log_info(&self, source: &str, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Info(source.to_string(), message.to_string()));
        }

        fn log_error(&self, source: &str, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Error(source.to_string(), message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Event, RecordingReporter};
    use super::*;
    use crate::models::EndpointTest;

    #[test]
    fn test_tracing_reporter_is_a_sink() {
        let reporter: Box<dyn Reporter> = Box::new(TracingReporter::new().with_bodies());
        let test = EndpointTest::new("GET", "posts").descriptor();
        reporter.log_result(&test, Some(&serde_json::json!([])), true, None);
        reporter.log_info("runner", "started");
        reporter.log_error("runner", "failed");
    }

    #[test]
    fn test_recording_reporter() {
        let reporter = RecordingReporter::default();
        let test = EndpointTest::new("get", "posts").descriptor();

        reporter.log_result(&test, None, false, Some("boom"));
        reporter.log_info("runner", "done");

        assert_eq!(
            reporter.events(),
            vec![
                Event::Result {
                    test: "GET posts".to_string(),
                    success: false,
                    error: Some("boom".to_string()),
                },
                Event::Info("runner".to_string(), "done".to_string()),
            ]
        );
    }
}
