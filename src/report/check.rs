//! Check results.
//!
//! This module provides the [`CheckResult`] type returned by check bodies,
//! with builder methods for attaching metrics and a description.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::registry::Severity;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    /// `Pass` when `ok` holds, `Fail` otherwise.
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Fail => write!(f, "fail"),
        }
    }
}

/// A structured diagnostic produced by a check.
///
/// A check body may leave `severity` unset; the executor fills in the
/// check's declared severity before the result is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Id of the check that produced this result.
    pub id: String,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub metrics: Map<String, Value>,
    #[serde(default)]
    pub description: String,
}

impl CheckResult {
    /// Create a result with the given status.
    pub fn new(id: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            id: id.into(),
            status,
            severity: None,
            metrics: Map::new(),
            description: String::new(),
        }
    }

    /// Create a passing result.
    pub fn pass(id: impl Into<String>) -> Self {
        Self::new(id, CheckStatus::Pass)
    }

    /// Create a failing result.
    pub fn fail(id: impl Into<String>) -> Self {
        Self::new(id, CheckStatus::Fail)
    }

    /// Result recorded when a check body itself errors.
    pub(crate) fn execution_error(id: &str, cause: &anyhow::Error) -> Self {
        Self::fail(id)
            .with_severity(Severity::Error)
            .with_metric("error", format!("{:#}", cause))
            .with_description("execution error")
    }

    /// Override the check's declared severity for this result.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Attach a metric.
    pub fn with_metric(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metrics.insert(key.into(), value.into());
        self
    }

    /// Set the human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Effective severity. Unset severities count as errors.
    pub fn severity(&self) -> Severity {
        self.severity.unwrap_or_default()
    }

    pub fn is_pass(&self) -> bool {
        self.status == CheckStatus::Pass
    }

    /// Whether this result blocks the run.
    pub fn is_blocking(&self) -> bool {
        self.status == CheckStatus::Fail && self.severity() == Severity::Error
    }
}
