//! Step declaration and registration.
//!
//! Steps are built with [`Step::task`] or [`Step::check`] and collected in
//! an explicit [`Registry`] that is later handed to the planner.

pub mod step;
pub mod store;

pub use step::{CheckFn, Severity, Step, StepBody, StepKind, TaskFn};
pub use store::Registry;
