//! JSON output formatter.
//!
//! Formats a run report as machine-readable JSON for dashboards and CI gates.

use super::ReportFormatter;
use crate::report::{CheckResult, ReportSummary, RunReport, Verdict};
use serde::Serialize;
use std::io::Write;

/// Formats reports as JSON.
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    verdict: Verdict,
    checks: Vec<JsonCheck<'a>>,
    summary: ReportSummary,
    executed: &'a [String],
    started_at: String,
    finished_at: String,
}

#[derive(Serialize)]
struct JsonCheck<'a> {
    id: &'a str,
    status: String,
    severity: String,
    metrics: &'a serde_json::Map<String, serde_json::Value>,
    description: &'a str,
}

impl<'a> From<&'a CheckResult> for JsonCheck<'a> {
    fn from(check: &'a CheckResult) -> Self {
        Self {
            id: &check.id,
            status: check.status.to_string(),
            severity: check.severity().to_string(),
            metrics: &check.metrics,
            description: &check.description,
        }
    }
}

impl JsonFormatter {
    /// Create a new JSON formatter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format<W: Write>(&self, report: &RunReport, writer: &mut W) -> std::io::Result<()> {
        let output = JsonOutput {
            verdict: report.verdict,
            checks: report.checks.iter().map(JsonCheck::from).collect(),
            summary: report.summary(),
            executed: &report.executed,
            started_at: report.started_at.to_rfc3339(),
            finished_at: report.finished_at.to_rfc3339(),
        };

        serde_json::to_writer_pretty(writer, &output).map_err(std::io::Error::other)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Severity;
    use chrono::Utc;

    #[test]
    fn produces_valid_json() {
        let report = RunReport::new(
            vec![
                CheckResult::pass("qc_basic")
                    .with_severity(Severity::Error)
                    .with_metric("rowcount", 3),
                CheckResult::fail("recap").with_severity(Severity::Info),
            ],
            vec!["build_dataset".into(), "qc_basic".into(), "recap".into()],
            Utc::now(),
        );

        let mut output = Vec::new();
        JsonFormatter::new().format(&report, &mut output).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["verdict"], "pass");
        assert_eq!(parsed["checks"][0]["id"], "qc_basic");
        assert_eq!(parsed["checks"][0]["status"], "pass");
        assert_eq!(parsed["checks"][0]["severity"], "error");
        assert_eq!(parsed["checks"][0]["metrics"]["rowcount"], 3);
        assert_eq!(parsed["checks"][1]["severity"], "info");
        assert_eq!(parsed["summary"]["total"], 2);
        assert_eq!(parsed["summary"]["infos"], 1);
        assert_eq!(parsed["executed"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn empty_report_has_empty_checks() {
        let report = RunReport::new(vec![], vec![], Utc::now());
        let mut output = Vec::new();
        JsonFormatter::new().format(&report, &mut output).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert!(parsed["checks"].as_array().unwrap().is_empty());
        assert_eq!(parsed["summary"]["total"], 0);
    }
}
