//! Output formatters for run results
//!
//! Provides table, JSON, and summary output formats.

use crate::models::{Outcome, OutcomeStatus, RunSummary, TestPlan};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn status_label(&self, status: OutcomeStatus) -> String {
        let plain = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return plain;
        }
        match status {
            OutcomeStatus::Pass => format!("\x1b[32m{plain}\x1b[0m"),
            OutcomeStatus::Fail => format!("\x1b[31m{plain}\x1b[0m"),
        }
    }

    fn format_outcome_row(&self, outcome: &Outcome) -> String {
        let mut row = format!(
            "{:7} {:40} {} [{:>6}ms]",
            outcome.test.method.to_uppercase(),
            outcome.test.endpoint,
            self.status_label(outcome.status()),
            outcome.duration_ms
        );
        if let Some(err) = &outcome.error {
            row.push_str(&format!("\n        └─ {}: {}", err.kind, err.message));
        }
        row
    }

    /// Format a run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Summary => summary.headline(),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n══════════════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(" Run against {}\n", summary.base_url));
        output.push_str(&format!(
            " Started {}\n",
            summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str("──────────────────────────────────────────────────────────────────────\n");

        for outcome in &summary.outcomes {
            output.push_str(&self.format_outcome_row(outcome));
            output.push('\n');
        }

        output.push_str("──────────────────────────────────────────────────────────────────────\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", summary.passed)
        } else {
            summary.passed.to_string()
        };
        let fail_str = if self.colorize && summary.failed > 0 {
            format!("\x1b[31m{}\x1b[0m", summary.failed)
        } else {
            summary.failed.to_string()
        };

        output.push_str(&format!(
            " Total: {} | Pass: {} | Fail: {} | Pass Rate: {:.1}% | Elapsed: {}ms | Test time: {}ms\n",
            summary.total,
            pass_str,
            fail_str,
            summary.pass_rate(),
            summary.elapsed_ms,
            summary.total_duration_ms
        ));
        output.push_str("══════════════════════════════════════════════════════════════════════\n");

        output
    }

    /// Format a compiled plan
    ///
    /// Table and summary formats list one test per line; the JSON formats
    /// emit the plan itself.
    pub fn format_plan(&self, plan: &TestPlan) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(plan).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Table | OutputFormat::Summary => {
                let mut output = format!("{} tests against {}\n", plan.len(), plan.base_url);
                for test in &plan.tests {
                    output.push_str(&format!(
                        "  {:7} {:40} -> {}\n",
                        test.method.to_uppercase(),
                        test.path,
                        test.expected_status
                    ));
                }
                output
            }
        }
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use crate::models::{AuthPolicy, EndpointTest};
    use chrono::Utc;
    use serde_json::json;

    fn summary() -> RunSummary {
        let ok = EndpointTest::new("GET", "posts");
        let missing = EndpointTest::new("get", "missing");
        RunSummary::new(
            "https://api.test",
            Utc::now(),
            vec![
                Outcome::pass(ok.descriptor(), json!([{"id": 1}]), 12),
                Outcome::error(
                    missing.descriptor(),
                    &ForgeError::NotFound {
                        url: "https://api.test/missing".into(),
                    },
                    3,
                ),
            ],
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("json-pretty"), Some(OutputFormat::JsonPretty));
        assert_eq!(OutputFormat::from_str("csv"), None);
    }

    #[test]
    fn test_formatter_creation() {
        let formatter = ResultFormatter::new(OutputFormat::Json).no_color();
        assert_eq!(formatter.format, OutputFormat::Json);
        assert!(!formatter.colorize);
    }

    #[test]
    fn test_table_summary() {
        let output = ResultFormatter::default().no_color().format_summary(&summary());
        assert!(output.contains("Run against https://api.test"));
        assert!(output.contains("✓ PASS"));
        assert!(output.contains("✗ FAIL"));
        assert!(output.contains("Endpoint not found"));
        assert!(output.contains("Total: 2 | Pass: 1 | Fail: 1"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_json_summary_is_parseable() {
        let output = ResultFormatter::new(OutputFormat::Json).format_summary(&summary());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total"], json!(2));
        assert_eq!(value["outcomes"][1]["success"], json!(false));
    }

    #[test]
    fn test_brief_summary() {
        let output = ResultFormatter::new(OutputFormat::Summary).format_summary(&summary());
        assert!(output.starts_with("1/2 passed"));
    }

    #[test]
    fn test_format_plan() {
        let plan = TestPlan::new(
            "https://x",
            AuthPolicy::new(),
            vec![EndpointTest::new("post", "posts").expect_status(201)],
        );

        let table = ResultFormatter::new(OutputFormat::Table).format_plan(&plan);
        assert!(table.starts_with("1 tests against https://x"));
        assert!(table.contains("POST"));
        assert!(table.contains("-> 201"));

        let json = ResultFormatter::new(OutputFormat::JsonPretty).format_plan(&plan);
        let back: TestPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
