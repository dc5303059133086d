//! Report output formatters.
//!
//! This module provides formatters for writing a [`RunReport`] in
//! different formats (human-readable, JSON).

pub mod human;
pub mod json;

use crate::report::RunReport;
use std::io::Write;

/// Output format for run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Trait for formatting report output.
pub trait ReportFormatter {
    /// Format the report to the given writer.
    fn format<W: Write>(&self, report: &RunReport, writer: &mut W) -> std::io::Result<()>;
}

/// Render a report to a string in the given format.
pub fn render(report: &RunReport, format: OutputFormat, use_color: bool) -> String {
    let mut output = Vec::new();
    let written = match format {
        OutputFormat::Human => HumanFormatter::new(use_color).format(report, &mut output),
        OutputFormat::Json => JsonFormatter::new().format(report, &mut output),
    };
    if let Err(e) = written {
        tracing::warn!("failed to render report: {}", e);
    }
    String::from_utf8(output).unwrap_or_default()
}

pub use human::HumanFormatter;
pub use json::JsonFormatter;
