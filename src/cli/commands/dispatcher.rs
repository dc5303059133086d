//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;

use super::plan::PlanCommand;
use super::run::RunCommand;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, writing its output to `out`.
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    working_dir: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher resolving relative paths against `working_dir`.
    pub fn new(working_dir: PathBuf) -> Self {
        Self { working_dir }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, out: &mut dyn Write) -> Result<CommandResult> {
        let config = cli.config.as_deref();
        match &cli.command {
            Commands::Run(args) => {
                let use_color = !cli.no_color && console::colors_enabled();
                RunCommand::new(&self.working_dir, config, args.clone(), use_color).execute(out)
            }
            Commands::Plan(args) => PlanCommand::new(args.clone()).execute(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(2);
        assert!(!result.success);
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn dispatches_plan() {
        let temp = TempDir::new().unwrap();
        let dispatcher = CommandDispatcher::new(temp.path().to_path_buf());
        let cli = Cli::parse_from(["stepgate", "plan"]);

        let mut out = Vec::new();
        let result = dispatcher.dispatch(&cli, &mut out).unwrap();
        assert!(result.success);
        assert!(String::from_utf8(out).unwrap().contains("build_dataset"));
    }

    #[test]
    fn dispatches_run() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("data.csv"), "region,amount\nnorth,3\n").unwrap();
        let dispatcher = CommandDispatcher::new(temp.path().to_path_buf());
        let cli = Cli::parse_from(["stepgate", "run", "--csv", "data.csv", "--no-color"]);

        let mut out = Vec::new();
        let result = dispatcher.dispatch(&cli, &mut out).unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(String::from_utf8(out).unwrap().contains("pass qc_basic"));
    }
}
