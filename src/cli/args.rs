//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::report::OutputFormat;

/// stepgate - run data tasks and quality checks, then gate on the verdict.
#[derive(Debug, Parser)]
#[command(name = "stepgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to run config (defaults to ./stepgate.yml when present)
    #[arg(short, long, global = true, env = "STEPGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the quality pipeline and print the report
    Run(RunArgs),

    /// Show the execution order without running anything
    Plan(PlanArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Read the dataset from this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Column to group the summary by
    #[arg(long)]
    pub group_key: Option<String>,

    /// Columns the dataset must contain (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub require: Vec<String>,

    /// Extra step parameter as key=value (repeatable; JSON values accepted)
    #[arg(short, long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, serde_json::Value)>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Also fail on warning-severity check failures
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlanArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parse `key=value`. The value is read as JSON when it parses, else as text.
fn parse_key_val(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no '=' in '{}'", s))?;
    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in '{}'", s));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
