//! Plan command implementation.
//!
//! Prints the order `run` would execute steps in, without running them.

use std::io::Write;

use serde::Serialize;

use crate::cli::args::PlanArgs;
use crate::error::Result;
use crate::pipelines::quality;
use crate::registry::{Severity, StepKind};
use crate::runner::ExecutionPlan;

use super::dispatcher::{Command, CommandResult};

/// The plan command implementation.
pub struct PlanCommand {
    args: PlanArgs,
}

#[derive(Debug, Serialize)]
struct PlannedStep<'a> {
    id: &'a str,
    kind: StepKind,
    requires: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
}

impl PlanCommand {
    /// Create a new plan command.
    pub fn new(args: PlanArgs) -> Self {
        Self { args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &PlanArgs {
        &self.args
    }

    fn write_human(&self, plan: &ExecutionPlan, out: &mut dyn Write) -> Result<()> {
        for (i, step) in plan.steps().iter().enumerate() {
            let kind = match step.declared_severity() {
                Some(severity) => format!("{}, {}", step.kind(), severity),
                None => step.kind().to_string(),
            };
            write!(out, "{}. {} ({})", i + 1, step.id(), kind)?;
            if !step.dependencies().is_empty() {
                write!(out, " <- {}", step.dependencies().join(", "))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_json(&self, plan: &ExecutionPlan, out: &mut dyn Write) -> Result<()> {
        let steps: Vec<PlannedStep<'_>> = plan
            .steps()
            .iter()
            .map(|step| PlannedStep {
                id: step.id(),
                kind: step.kind(),
                requires: step.dependencies(),
                severity: step.declared_severity(),
            })
            .collect();
        let json = serde_json::to_string_pretty(&steps).map_err(anyhow::Error::from)?;
        writeln!(out, "{}", json)?;
        Ok(())
    }
}

impl Command for PlanCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let registry = quality::registry()?;
        let plan = ExecutionPlan::from_registry(&registry)?;
        tracing::debug!(steps = plan.len(), "resolved execution plan");

        if self.args.json {
            self.write_json(&plan, out)?;
        } else {
            self.write_human(&plan, out)?;
        }
        Ok(CommandResult::success())
    }
}
