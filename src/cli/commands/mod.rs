//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands (`stepgate run`, `stepgate plan`) to their implementations.

pub mod dispatcher;
pub mod plan;
pub mod run;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use plan::PlanCommand;
pub use run::RunCommand;
