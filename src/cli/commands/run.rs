//! Run command implementation.
//!
//! The `stepgate run` command executes the quality pipeline and prints the
//! report. Exit codes: 0 when the verdict passes, 1 when it fails, 2 when
//! the run aborts.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::cli::args::RunArgs;
use crate::config::load_config;
use crate::error::Result;
use crate::pipelines::quality::{self, SOURCE_KEY};
use crate::registry::Severity;
use crate::report::output::render;
use crate::runner::{Env, ExecutionPlan, Executor, Params, RunContext};
use crate::source::DataSource;

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    working_dir: PathBuf,
    config: Option<PathBuf>,
    args: RunArgs,
    use_color: bool,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(working_dir: &Path, config: Option<&Path>, args: RunArgs, use_color: bool) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            config: config.map(Path::to_path_buf),
            args,
            use_color,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Config params with CLI flags layered on top.
    fn params(&self, base: Params) -> Params {
        let mut params = base;
        let mut overrides = Params::new();
        if let Some(key) = &self.args.group_key {
            overrides.insert("group_key", key.as_str());
        }
        if !self.args.require.is_empty() {
            overrides.insert("required_columns", json!(self.args.require));
        }
        for (key, value) in &self.args.params {
            overrides.insert(key.as_str(), value.clone());
        }
        params.merge(overrides);
        params
    }
}

impl Command for RunCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let loaded = load_config(self.config.as_deref(), &self.working_dir)?;

        let source = match &self.args.csv {
            Some(csv) => Some(DataSource::Csv(self.working_dir.join(csv))),
            None => loaded
                .config
                .source
                .as_ref()
                .and_then(|s| s.to_data_source(&loaded.base_dir)),
        };

        let mut env = Env::new();
        if let Some(source) = source {
            tracing::debug!(source = ?source, "using data source");
            env.insert(SOURCE_KEY, source);
        }
        let params = self.params(loaded.config.params);

        let registry = quality::registry()?;
        let plan = ExecutionPlan::from_registry(&registry)?;
        let mut ctx = RunContext::new(env, params);

        match Executor::new(&plan).run(&mut ctx) {
            Ok(report) => {
                write!(out, "{}", render(&report, self.args.format, self.use_color))?;
                let failed = !report.is_pass()
                    || (self.args.strict && report.has_failures_at(Severity::Warning));
                if failed {
                    Ok(CommandResult::failure(1))
                } else {
                    Ok(CommandResult::success())
                }
            }
            Err(aborted) => {
                write!(
                    out,
                    "{}",
                    render(&aborted.report, self.args.format, self.use_color)
                )?;
                eprintln!("Error: {}", aborted);
                Ok(CommandResult::failure(2))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::OutputFormat;
    use std::fs;
    use tempfile::TempDir;

    const ORDERS: &str = "region,amount\nnorth,3\nsouth,5\nnorth,7\n";

    fn setup_project(csv: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("orders.csv"), csv).unwrap();
        temp
    }

    fn run(temp: &TempDir, args: RunArgs) -> (CommandResult, String) {
        let cmd = RunCommand::new(temp.path(), None, args, false);
        let mut out = Vec::new();
        let result = cmd.execute(&mut out).unwrap();
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn passing_run_exits_zero() {
        let temp = setup_project(ORDERS);
        let (result, output) = run(
            &temp,
            RunArgs {
                csv: Some("orders.csv".into()),
                ..Default::default()
            },
        );
        assert_eq!(result.exit_code, 0);
        assert!(output.contains("pass qc_basic [error]"));
        assert!(output.contains("PASS"));
    }

    #[test]
    fn missing_required_column_exits_one() {
        let temp = setup_project(ORDERS);
        let (result, output) = run(
            &temp,
            RunArgs {
                csv: Some("orders.csv".into()),
                require: vec!["store".into()],
                format: OutputFormat::Json,
                ..Default::default()
            },
        );
        assert_eq!(result.exit_code, 1);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["verdict"], "fail");
        assert_eq!(parsed["checks"][0]["metrics"]["missing_columns"][0], "store");
    }

    #[test]
    fn unknown_group_key_aborts_with_exit_two() {
        let temp = setup_project(ORDERS);
        let (result, _) = run(
            &temp,
            RunArgs {
                csv: Some("orders.csv".into()),
                group_key: Some("store".into()),
                ..Default::default()
            },
        );
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn config_file_supplies_source_and_params() {
        let temp = setup_project(ORDERS);
        fs::write(
            temp.path().join("stepgate.yml"),
            "source:\n  csv: orders.csv\nparams:\n  required_columns: [region, amount]\n",
        )
        .unwrap();

        let (result, output) = run(
            &temp,
            RunArgs {
                format: OutputFormat::Json,
                ..Default::default()
            },
        );
        assert_eq!(result.exit_code, 0);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["checks"][0]["metrics"]["rowcount"], 3);
    }

    #[test]
    fn cli_flags_override_config_params() {
        let cmd = RunCommand::new(
            Path::new("."),
            None,
            RunArgs {
                group_key: Some("store".into()),
                require: vec!["a".into()],
                params: vec![("group_key".into(), json!("region"))],
                ..Default::default()
            },
            false,
        );
        let params = cmd.params(Params::new().with("group_key", "zone").with("x", 1));
        // explicit --param wins over --group-key, both win over config
        assert_eq!(params.str("group_key"), Some("region"));
        assert_eq!(params.string_list("required_columns"), vec!["a"]);
        assert_eq!(params.get("x"), Some(&json!(1)));
    }

    #[test]
    fn no_source_fails_qc() {
        let temp = TempDir::new().unwrap();
        let (result, output) = run(&temp, RunArgs::default());
        assert_eq!(result.exit_code, 1);
        assert!(output.contains("FAIL qc_basic"));
    }

    #[test]
    fn strict_mode_is_accepted_on_clean_run() {
        let temp = setup_project(ORDERS);
        let (result, _) = run(
            &temp,
            RunArgs {
                csv: Some("orders.csv".into()),
                strict: true,
                ..Default::default()
            },
        );
        assert_eq!(result.exit_code, 0);
    }
}
