//! Step execution orchestration.

pub mod context;
pub mod dependency;
pub mod executor;

pub use context::{Env, Params, RunContext, Value};
pub use dependency::ExecutionPlan;
pub use executor::{Executor, RunError};
