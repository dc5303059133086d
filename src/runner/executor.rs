//! Step execution engine.
//!
//! Walks an [`ExecutionPlan`] in order, invoking each step with the run
//! context. A failing task aborts the run; a failing check is recorded as
//! an error-severity result and the run continues.

use std::time::Instant;

use chrono::Utc;
use thiserror::Error;

use super::context::RunContext;
use super::dependency::ExecutionPlan;
use crate::error::StepgateError;
use crate::registry::{Step, StepBody};
use crate::report::{CheckResult, RunReport};

/// A run that stopped before reaching the end of its plan.
///
/// Carries the partial report: every check recorded before the abort.
#[derive(Debug, Error)]
#[error("run aborted at step '{step}': {error}")]
pub struct RunError {
    /// Id of the step that stopped the run.
    pub step: String,
    pub report: RunReport,
    #[source]
    pub error: StepgateError,
}

/// Executes plans against run contexts.
///
/// The plan is shared read-only, so one executor can serve concurrent runs
/// as long as each run has its own [`RunContext`].
#[derive(Debug, Clone, Copy)]
pub struct Executor<'a> {
    plan: &'a ExecutionPlan,
}

impl<'a> Executor<'a> {
    pub fn new(plan: &'a ExecutionPlan) -> Self {
        Self { plan }
    }

    /// Run every step in plan order.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] with the partial report when a task fails or a
    /// step breaks its contract (reads a result it may not see, or a check
    /// answers for another id).
    pub fn run(&self, ctx: &mut RunContext) -> std::result::Result<RunReport, RunError> {
        let started_at = Utc::now();
        let mut checks: Vec<CheckResult> = Vec::new();
        let mut executed: Vec<String> = Vec::new();

        tracing::info!(steps = self.plan.len(), "starting run");

        for step in self.plan.steps() {
            if let Err(error) = self.execute_step(step, ctx, &mut checks) {
                let skipped = self.plan.len() - executed.len() - 1;
                tracing::warn!(
                    step = step.id(),
                    dependents = self.plan.transitive_dependents(step.id()).len(),
                    skipped,
                    "aborting run: {}",
                    error
                );
                return Err(RunError {
                    step: step.id().to_string(),
                    report: RunReport::new(checks, executed, started_at),
                    error,
                });
            }
            executed.push(step.id().to_string());
        }

        let report = RunReport::new(checks, executed, started_at);
        tracing::info!(
            verdict = %report.verdict,
            checks = report.checks.len(),
            "run finished"
        );
        Ok(report)
    }

    fn execute_step(
        &self,
        step: &Step,
        ctx: &mut RunContext,
        checks: &mut Vec<CheckResult>,
    ) -> Result<(), StepgateError> {
        for dep in step.dependencies() {
            if !ctx.is_completed(dep) {
                return Err(StepgateError::DependencyNotCompleted {
                    step: step.id().to_string(),
                    dependency: dep.clone(),
                });
            }
        }

        tracing::debug!(step = step.id(), kind = %step.kind(), "running step");
        let start = Instant::now();

        match step.body() {
            StepBody::Task(body) => {
                let value = body(ctx).map_err(|cause| abort_error(step, cause))?;
                ctx.insert_result(step.id(), value)?;
            }
            StepBody::Check(body) => {
                let result = match body(ctx) {
                    Ok(mut result) => {
                        if result.id != step.id() {
                            return Err(StepgateError::CheckIdentityMismatch {
                                expected: step.id().to_string(),
                                actual: result.id,
                            });
                        }
                        if result.severity.is_none() {
                            result.severity = step.declared_severity();
                        }
                        result
                    }
                    Err(cause) => {
                        if is_contract_violation(&cause) {
                            return Err(abort_error(step, cause));
                        }
                        tracing::warn!(step = step.id(), "check raised: {:#}", cause);
                        CheckResult::execution_error(step.id(), &cause)
                    }
                };

                if !result.is_pass() {
                    tracing::warn!(
                        step = step.id(),
                        severity = %result.severity(),
                        "check failed: {}",
                        result.description
                    );
                }
                ctx.record_check(result.clone());
                checks.push(result);
            }
        }

        tracing::debug!(
            step = step.id(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "step completed"
        );
        Ok(())
    }
}

fn is_contract_violation(cause: &anyhow::Error) -> bool {
    cause
        .downcast_ref::<StepgateError>()
        .is_some_and(StepgateError::is_contract_violation)
}

/// Turn a body error into the error that aborts the run.
///
/// Contract violations raised through the context propagate unchanged;
/// anything else becomes `StepFailed`.
fn abort_error(step: &Step, cause: anyhow::Error) -> StepgateError {
    let cause = if is_contract_violation(&cause) {
        match cause.downcast::<StepgateError>() {
            Ok(error) => return error,
            Err(cause) => cause,
        }
    } else {
        cause
    };
    StepgateError::StepFailed {
        id: step.id().to_string(),
        source: cause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Severity;
    use crate::report::{CheckStatus, Verdict};
    use crate::runner::context::{Env, Params};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn plan(steps: Vec<Step>) -> ExecutionPlan {
        ExecutionPlan::build(&steps).unwrap()
    }

    #[test]
    fn tasks_store_results_in_order() {
        let plan = plan(vec![
            Step::task("a", |_| Ok(2_i64)),
            Step::task("b", |ctx| Ok(*ctx.get::<i64>("a")? * 10)).requires(["a"]),
        ]);
        let mut ctx = RunContext::default();
        let report = Executor::new(&plan).run(&mut ctx).unwrap();

        assert_eq!(*ctx.get::<i64>("b").unwrap(), 20);
        assert_eq!(report.executed, vec!["a", "b"]);
        assert!(report.checks.is_empty());
        assert_eq!(report.verdict, Verdict::Pass);
    }

    #[test]
    fn check_inherits_declared_severity() {
        let plan = plan(vec![
            Step::check("w", |_| Ok(CheckResult::fail("w"))).severity(Severity::Warning)
        ]);
        let report = Executor::new(&plan)
            .run(&mut RunContext::default())
            .unwrap();
        assert_eq!(report.checks[0].severity, Some(Severity::Warning));
        assert_eq!(report.verdict, Verdict::Pass);
    }

    #[test]
    fn check_can_override_severity() {
        let plan = plan(vec![Step::check("i", |_| {
            Ok(CheckResult::fail("i").with_severity(Severity::Info))
        })]);
        let report = Executor::new(&plan)
            .run(&mut RunContext::default())
            .unwrap();
        assert_eq!(report.checks[0].severity, Some(Severity::Info));
    }

    #[test]
    fn check_identity_mismatch_aborts() {
        let plan = plan(vec![
            Step::check("qc", |_| Ok(CheckResult::pass("other"))),
            Step::task("after", |_| Ok(())),
        ]);
        let mut ctx = RunContext::default();
        let err = Executor::new(&plan).run(&mut ctx).unwrap_err();
        assert!(matches!(
            err.error,
            StepgateError::CheckIdentityMismatch { ref expected, ref actual }
                if expected == "qc" && actual == "other"
        ));
        assert_eq!(err.step, "qc");
        assert!(!ctx.is_completed("after"));
    }

    #[test]
    fn raising_check_is_recorded_and_run_continues() {
        let plan = plan(vec![
            Step::check("broken", |_| -> anyhow::Result<CheckResult> {
                anyhow::bail!("bad metric")
            })
            .severity(Severity::Info),
            Step::check("fine", |_| Ok(CheckResult::pass("fine"))),
        ]);
        let report = Executor::new(&plan)
            .run(&mut RunContext::default())
            .unwrap();

        let broken = report.check("broken").unwrap();
        assert_eq!(broken.status, CheckStatus::Fail);
        assert_eq!(broken.severity, Some(Severity::Error));
        assert_eq!(broken.description, "execution error");
        assert!(report.check("fine").unwrap().is_pass());
        assert_eq!(report.verdict, Verdict::Fail);
    }

    #[test]
    fn failing_task_stops_everything_after_it() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let plan = plan(vec![
            Step::check("early", |_| Ok(CheckResult::pass("early"))),
            Step::task("boom", |_| -> anyhow::Result<()> { anyhow::bail!("disk full") }),
            Step::task("independent", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        ]);
        let err = Executor::new(&plan)
            .run(&mut RunContext::default())
            .unwrap_err();

        assert!(matches!(err.error, StepgateError::StepFailed { ref id, .. } if id == "boom"));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(err.report.executed, vec!["early"]);
        assert_eq!(err.report.checks.len(), 1);
    }

    #[test]
    fn reading_unavailable_result_aborts_even_in_check() {
        let plan = plan(vec![
            Step::task("late", |_| Ok(1_u8)),
            Step::check("eager", |ctx| {
                ctx.get::<u8>("nowhere")?;
                Ok(CheckResult::pass("eager"))
            }),
        ]);
        let err = Executor::new(&plan)
            .run(&mut RunContext::default())
            .unwrap_err();
        assert!(
            matches!(err.error, StepgateError::ResultNotAvailable { ref id } if id == "nowhere")
        );
        assert_eq!(err.step, "eager");
        assert!(err.to_string().contains("step 'eager'"));
    }

    #[test]
    fn type_mismatch_in_task_propagates_unwrapped() {
        let plan = plan(vec![
            Step::task("a", |_| Ok(1_u8)),
            Step::task("b", |ctx| Ok(ctx.get::<String>("a")?.len())).requires(["a"]),
        ]);
        let err = Executor::new(&plan)
            .run(&mut RunContext::default())
            .unwrap_err();
        assert!(matches!(err.error, StepgateError::ResultTypeMismatch { .. }));
        assert_eq!(err.step, "b");
    }

    #[test]
    fn check_can_read_earlier_check() {
        let plan = plan(vec![
            Step::check("first", |_| Ok(CheckResult::fail("first"))).severity(Severity::Warning),
            Step::check("second", |ctx| {
                let first = ctx.check_result("first")?;
                Ok(CheckResult::new("second", first.status))
            })
            .requires(["first"])
            .severity(Severity::Info),
        ]);
        let report = Executor::new(&plan)
            .run(&mut RunContext::default())
            .unwrap();
        assert_eq!(report.check("second").unwrap().status, CheckStatus::Fail);
        assert_eq!(report.verdict, Verdict::Pass);
    }

    #[test]
    fn steps_see_env_and_params() {
        let plan = plan(vec![Step::task("greet", |ctx| {
            let name = ctx.params().str("name").unwrap_or("nobody");
            let greeting = ctx.env().get::<String>("greeting").cloned().unwrap_or_default();
            Ok(format!("{greeting}, {name}"))
        })]);
        let mut ctx = RunContext::new(
            Env::new().with("greeting", "hello".to_string()),
            Params::new().with("name", "ada"),
        );
        Executor::new(&plan).run(&mut ctx).unwrap();
        assert_eq!(ctx.get::<String>("greet").unwrap(), "hello, ada");
    }
}
