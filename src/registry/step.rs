//! Step definitions.
//!
//! This module provides the core types for declaring units of work:
//!
//! - [`Step`] - A registered task or check with its dependencies
//! - [`StepKind`] - Whether a step produces a value or a diagnostic
//! - [`Severity`] - Severity level of a check (Info, Warning, Error)

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::report::CheckResult;
use crate::runner::context::{RunContext, Value};

/// Body of a task: produces a type-erased value from the run context.
pub type TaskFn = dyn Fn(&RunContext) -> anyhow::Result<Value> + Send + Sync;

/// Body of a check: produces a structured diagnostic from the run context.
pub type CheckFn = dyn Fn(&RunContext) -> anyhow::Result<CheckResult> + Send + Sync;

/// Severity level for check results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding, never affects the verdict.
    Info,
    /// Advisory finding that should be looked at.
    Warning,
    /// Hard violation that fails the run.
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Whether a step is a task or a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Task,
    Check,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Task => write!(f, "task"),
            StepKind::Check => write!(f, "check"),
        }
    }
}

/// The callable part of a step.
#[derive(Clone)]
pub enum StepBody {
    Task(Arc<TaskFn>),
    Check(Arc<CheckFn>),
}

/// A declared unit of work.
///
/// Steps are immutable once built. Cloning is cheap: the body is shared.
#[derive(Clone)]
pub struct Step {
    id: String,
    requires: Vec<String>,
    severity: Severity,
    body: StepBody,
}

impl Step {
    /// Declare a task whose body returns any `Send + Sync` value.
    pub fn task<T, F>(id: impl Into<String>, body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&RunContext) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let body: Arc<TaskFn> = Arc::new(move |ctx| body(ctx).map(|v| Arc::new(v) as Value));
        Self {
            id: id.into(),
            requires: Vec::new(),
            severity: Severity::default(),
            body: StepBody::Task(body),
        }
    }

    /// Declare a check. Severity defaults to [`Severity::Error`].
    pub fn check<F>(id: impl Into<String>, body: F) -> Self
    where
        F: Fn(&RunContext) -> anyhow::Result<CheckResult> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            requires: Vec::new(),
            severity: Severity::default(),
            body: StepBody::Check(Arc::new(body)),
        }
    }

    /// Set the ids this step depends on, in declaration order.
    pub fn requires<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the severity a check's results default to.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> StepKind {
        match self.body {
            StepBody::Task(_) => StepKind::Task,
            StepBody::Check(_) => StepKind::Check,
        }
    }

    pub fn dependencies(&self) -> &[String] {
        &self.requires
    }

    /// Declared severity. Only checks carry one.
    pub fn declared_severity(&self) -> Option<Severity> {
        match self.body {
            StepBody::Check(_) => Some(self.severity),
            StepBody::Task(_) => None,
        }
    }

    pub fn body(&self) -> &StepBody {
        &self.body
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("requires", &self.requires)
            .field("severity", &self.declared_severity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_has_no_severity() {
        let step = Step::task("load", |_| Ok(1_u32));
        assert_eq!(step.kind(), StepKind::Task);
        assert_eq!(step.declared_severity(), None);
        assert!(step.dependencies().is_empty());
    }

    #[test]
    fn check_defaults_to_error_severity() {
        let step = Step::check("qc", |_| Ok(CheckResult::pass("qc")));
        assert_eq!(step.kind(), StepKind::Check);
        assert_eq!(step.declared_severity(), Some(Severity::Error));
    }

    #[test]
    fn builder_sets_requires_and_severity() {
        let step = Step::check("qc", |_| Ok(CheckResult::pass("qc")))
            .requires(["load", "clean"])
            .severity(Severity::Warning);
        assert_eq!(step.dependencies(), ["load", "clean"]);
        assert_eq!(step.declared_severity(), Some(Severity::Warning));
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
        let parsed: Severity = serde_json::from_str("\"info\"").unwrap();
        assert_eq!(parsed, Severity::Info);
    }

    #[test]
    fn debug_omits_body() {
        let step = Step::task("load", |_| Ok(()));
        let rendered = format!("{:?}", step);
        assert!(rendered.contains("load"));
        assert!(rendered.contains("Task"));
    }
}
