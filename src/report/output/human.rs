//! Human-readable output formatter.
//!
//! Formats a run report for terminal display with optional color support.

use super::ReportFormatter;
use crate::registry::Severity;
use crate::report::{CheckResult, CheckStatus, RunReport, Verdict};
use console::Style;
use std::io::Write;

/// Formats reports for human consumption.
pub struct HumanFormatter {
    /// Whether to use colors (ANSI escape codes).
    pub use_color: bool,
}

impl HumanFormatter {
    /// Create a new human formatter.
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.use_color {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn status_label(&self, check: &CheckResult) -> String {
        match (check.status, check.severity()) {
            (CheckStatus::Pass, _) => self.paint(Style::new().green(), "pass"),
            (CheckStatus::Fail, Severity::Error) => self.paint(Style::new().red().bold(), "FAIL"),
            (CheckStatus::Fail, Severity::Warning) => {
                self.paint(Style::new().color256(208), "warn")
            }
            (CheckStatus::Fail, Severity::Info) => self.paint(Style::new().dim(), "note"),
        }
    }
}

impl ReportFormatter for HumanFormatter {
    fn format<W: Write>(&self, report: &RunReport, writer: &mut W) -> std::io::Result<()> {
        for check in &report.checks {
            writeln!(
                writer,
                "{} {} [{}]",
                self.status_label(check),
                check.id,
                check.severity()
            )?;

            if !check.description.is_empty() {
                writeln!(writer, "   {}", check.description)?;
            }

            for (key, value) in &check.metrics {
                writeln!(
                    writer,
                    "   {} {} = {}",
                    self.paint(Style::new().dim(), "·"),
                    key,
                    value
                )?;
            }
        }

        if !report.checks.is_empty() {
            writeln!(writer)?;
        }

        let summary = report.summary();
        let verdict = match report.verdict {
            Verdict::Pass => self.paint(Style::new().green().bold(), "PASS"),
            Verdict::Fail => self.paint(Style::new().red().bold(), "FAIL"),
        };
        writeln!(
            writer,
            "{}: {} check(s), {} passed, {} error(s), {} warning(s), {} info",
            verdict, summary.total, summary.passed, summary.errors, summary.warnings, summary.infos
        )?;

        Ok(())
    }
}
