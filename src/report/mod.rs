//! Check results, verdicts, and report rendering.

pub mod check;
pub mod output;
pub mod verdict;

pub use check::{CheckResult, CheckStatus};
pub use output::{HumanFormatter, JsonFormatter, OutputFormat, ReportFormatter};
pub use verdict::{aggregate, ReportSummary, RunReport, Verdict};
