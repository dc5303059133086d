//! Stepgate - run dependent data tasks and quality checks, then gate on the
//! verdict.
//!
//! Steps are registered by id in a [`Registry`]. Tasks produce values that
//! later steps read back by id; checks produce a [`CheckResult`] with a
//! pass/fail status and a severity. An [`ExecutionPlan`] orders the steps so
//! every dependency runs first, and the [`Executor`] runs the plan against a
//! [`RunContext`], returning a [`RunReport`] whose verdict fails only when an
//! error-severity check fails.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Run configuration loading
//! - [`error`] - Error types and result aliases
//! - [`pipelines`] - The stock dataset quality pipeline
//! - [`registry`] - Step declarations and the registry
//! - [`report`] - Check results, verdict aggregation and report output
//! - [`runner`] - Execution planning, run context and the executor
//! - [`source`] - Tabular data sources
//!
//! # Example
//!
//! ```
//! use stepgate::{CheckResult, CheckStatus, ExecutionPlan, Executor, Registry, RunContext, Step};
//!
//! let mut registry = Registry::new();
//! registry.register(Step::task("a", |_| Ok(2_i64))).unwrap();
//! registry
//!     .register(
//!         Step::check("positive", |ctx| {
//!             let a = ctx.get::<i64>("a")?;
//!             Ok(CheckResult::new("positive", CheckStatus::from_bool(*a > 0)))
//!         })
//!         .requires(["a"]),
//!     )
//!     .unwrap();
//!
//! let plan = ExecutionPlan::from_registry(&registry).unwrap();
//! let mut ctx = RunContext::default();
//! let report = Executor::new(&plan).run(&mut ctx).unwrap();
//! assert!(report.is_pass());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod pipelines;
pub mod registry;
pub mod report;
pub mod runner;
pub mod source;

pub use error::{Result, StepgateError};
pub use registry::{Registry, Severity, Step, StepKind};
pub use report::{aggregate, CheckResult, CheckStatus, RunReport, Verdict};
pub use runner::{Env, ExecutionPlan, Executor, Params, RunContext, RunError};
