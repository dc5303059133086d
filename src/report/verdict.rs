//! Verdict aggregation and the run report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::check::{CheckResult, CheckStatus};
use crate::registry::Severity;

/// Single pass/fail summary of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Fail => write!(f, "fail"),
        }
    }
}

/// Compute the run verdict from check results.
///
/// The verdict is `Fail` iff at least one result failed with error severity.
/// Failing warnings and infos are recorded but never flip the verdict.
pub fn aggregate(results: &[CheckResult]) -> Verdict {
    if results.iter().any(CheckResult::is_blocking) {
        Verdict::Fail
    } else {
        Verdict::Pass
    }
}

/// Failure counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

/// Outcome of one run: every check result in execution order plus the verdict.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub checks: Vec<CheckResult>,
    pub verdict: Verdict,
    /// Ids of the steps that executed, in order.
    pub executed: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Build a report, computing the verdict from `checks`.
    pub fn new(checks: Vec<CheckResult>, executed: Vec<String>, started_at: DateTime<Utc>) -> Self {
        let verdict = aggregate(&checks);
        Self {
            checks,
            verdict,
            executed,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Look up a check result by id.
    pub fn check(&self, id: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.id == id)
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Whether any check failed at or above `severity`.
    pub fn has_failures_at(&self, severity: Severity) -> bool {
        self.checks
            .iter()
            .any(|c| c.status == CheckStatus::Fail && c.severity() >= severity)
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.checks.len(),
            ..Default::default()
        };
        for check in &self.checks {
            match (check.status, check.severity()) {
                (CheckStatus::Pass, _) => summary.passed += 1,
                (CheckStatus::Fail, Severity::Error) => summary.errors += 1,
                (CheckStatus::Fail, Severity::Warning) => summary.warnings += 1,
                (CheckStatus::Fail, Severity::Info) => summary.infos += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(id: &str, severity: Severity) -> CheckResult {
        CheckResult::fail(id).with_severity(severity)
    }

    #[test]
    fn no_checks_passes() {
        assert_eq!(aggregate(&[]), Verdict::Pass);
    }

    #[test]
    fn error_failure_fails() {
        let results = vec![
            CheckResult::pass("a").with_severity(Severity::Error),
            failing("b", Severity::Error),
        ];
        assert_eq!(aggregate(&results), Verdict::Fail);
    }

    #[test]
    fn warning_and_info_failures_pass() {
        let results = vec![failing("a", Severity::Warning), failing("b", Severity::Info)];
        assert_eq!(aggregate(&results), Verdict::Pass);
    }

    #[test]
    fn report_summary_counts_by_severity() {
        let report = RunReport::new(
            vec![
                CheckResult::pass("a").with_severity(Severity::Error),
                failing("b", Severity::Error),
                failing("c", Severity::Warning),
                failing("d", Severity::Info),
            ],
            vec![],
            Utc::now(),
        );
        let summary = report.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.infos, 1);
        assert_eq!(report.verdict, Verdict::Fail);
    }

    #[test]
    fn has_failures_at_threshold() {
        let report = RunReport::new(vec![failing("c", Severity::Warning)], vec![], Utc::now());
        assert!(report.is_pass());
        assert!(report.has_failures_at(Severity::Warning));
        assert!(!report.has_failures_at(Severity::Error));
    }

    #[test]
    fn check_lookup_by_id() {
        let report = RunReport::new(vec![CheckResult::pass("qc")], vec![], Utc::now());
        assert!(report.check("qc").is_some());
        assert!(report.check("missing").is_none());
    }
}
