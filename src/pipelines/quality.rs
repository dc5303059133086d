//! Dataset quality pipeline.
//!
//! Builds a dataset from whichever [`DataSource`] the caller put in the env,
//! summarizes its numeric columns per group, and checks it.
//!
//! Parameters read (all optional):
//!
//! - `group_key` - column to group by (defaults to the first column)
//! - `required_columns` - columns `qc_basic` requires (defaults to none)

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use anyhow::bail;
use serde_json::{json, Number, Value};

use crate::error::Result;
use crate::registry::{Registry, Severity, Step};
use crate::report::{CheckResult, CheckStatus};
use crate::runner::RunContext;
use crate::source::{DataSource, Table};

pub const BUILD_DATASET: &str = "build_dataset";
pub const SUMMARIZE: &str = "summarize";
pub const QC_BASIC: &str = "qc_basic";
pub const RECAP: &str = "recap";

/// Env key holding the [`DataSource`].
pub const SOURCE_KEY: &str = "source";

const PREVIEW_ROWS: usize = 5;

/// Register the pipeline's steps.
pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(Step::task(BUILD_DATASET, build_dataset))?;
    registry.register(Step::task(SUMMARIZE, summarize).requires([BUILD_DATASET]))?;
    registry.register(
        Step::check(QC_BASIC, qc_basic)
            .requires([BUILD_DATASET])
            .severity(Severity::Error),
    )?;
    registry.register(
        Step::check(RECAP, recap)
            .requires([SUMMARIZE])
            .severity(Severity::Info),
    )?;
    Ok(())
}

/// A registry holding just this pipeline.
pub fn registry() -> Result<Registry> {
    let mut registry = Registry::new();
    register(&mut registry)?;
    Ok(registry)
}

fn build_dataset(ctx: &RunContext) -> anyhow::Result<Table> {
    match ctx.env().get::<DataSource>(SOURCE_KEY) {
        Some(source) => {
            tracing::debug!(source = source.kind(), "building dataset");
            Ok(source.load()?)
        }
        None => {
            tracing::debug!("no data source configured, using empty dataset");
            Ok(Table::empty())
        }
    }
}

fn summarize(ctx: &RunContext) -> anyhow::Result<Table> {
    let df = ctx.get::<Table>(BUILD_DATASET)?;
    if df.is_empty() {
        return Ok(Table::empty());
    }

    let key = ctx
        .params()
        .text("group_key")
        .unwrap_or_else(|| df.columns()[0].clone());
    let key = key.as_str();
    let Some(key_idx) = df.column_index(key) else {
        bail!("group key '{}' is not a column", key);
    };

    let numeric: Vec<usize> = (0..df.columns().len())
        .filter(|&i| i != key_idx && is_numeric_column(df, i))
        .collect();

    if numeric.is_empty() {
        return distinct_keys(df, key, key_idx);
    }

    let mut columns = vec![key.to_string()];
    for &i in &numeric {
        let name = &df.columns()[i];
        columns.extend(["min", "max", "mean"].map(|agg| format!("{}_{}", name, agg)));
    }

    let mut summary = Table::new(columns);
    for (group_key, rows) in sorted_groups(df, key_idx) {
        let mut row = vec![group_key];
        for &i in &numeric {
            let cells: Vec<&Number> = rows
                .iter()
                .filter_map(|&r| match &df.rows()[r][i] {
                    Value::Number(n) => Some(n),
                    _ => None,
                })
                .collect();
            row.extend(aggregate_numbers(&cells));
        }
        summary.push_row(row)?;
    }
    Ok(summary)
}

fn qc_basic(ctx: &RunContext) -> anyhow::Result<CheckResult> {
    let df = ctx.get::<Table>(BUILD_DATASET)?;
    let must_have = ctx.params().string_list("required_columns");
    let missing: Vec<String> = must_have
        .into_iter()
        .filter(|c| !df.has_column(c))
        .collect();

    let status = CheckStatus::from_bool(df.row_count() > 0 && missing.is_empty());
    Ok(CheckResult::new(QC_BASIC, status)
        .with_metric("rowcount", df.row_count())
        .with_metric("missing_columns", missing)
        .with_description("Dataset non-empty and contains required columns."))
}

fn recap(ctx: &RunContext) -> anyhow::Result<CheckResult> {
    let summary = ctx.get::<Table>(SUMMARIZE)?;
    let sample = summary.head_records(PREVIEW_ROWS);
    Ok(CheckResult::pass(RECAP)
        .with_severity(Severity::Info)
        .with_metric("summary_preview_rows", sample.len())
        .with_metric("sample", json!(sample))
        .with_description("Preview of summary."))
}

/// A column is numeric when every non-null cell is a number and at least
/// one cell is present.
fn is_numeric_column(table: &Table, idx: usize) -> bool {
    let mut seen = false;
    for row in table.rows() {
        match &row[idx] {
            Value::Null => {}
            Value::Number(_) => seen = true,
            _ => return false,
        }
    }
    seen
}

/// Identity of a group key. Numbers compare by value, so `1` and `1.0`
/// land in the same group.
#[derive(Debug, PartialEq, Eq, Hash)]
enum KeyId {
    Number(u64),
    Other(String),
}

impl KeyId {
    fn of(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                // -0.0 and 0.0 are one key
                Some(f) if f == 0.0 => KeyId::Number(0.0_f64.to_bits()),
                Some(f) => KeyId::Number(f.to_bits()),
                None => KeyId::Other(n.to_string()),
            },
            other => KeyId::Other(other.to_string()),
        }
    }
}

/// Distinct values of the key column with a `_rows` marker, in first-seen order.
fn distinct_keys(df: &Table, key: &str, key_idx: usize) -> anyhow::Result<Table> {
    let mut seen = HashSet::new();
    let mut out = Table::new([key, "_rows"]);
    for row in df.rows() {
        let value = &row[key_idx];
        if seen.insert(KeyId::of(value)) {
            out.push_row(vec![value.clone(), json!(1)])?;
        }
    }
    Ok(out)
}

/// Row indices grouped by key, groups sorted by key, null keys dropped.
fn sorted_groups(df: &Table, key_idx: usize) -> Vec<(Value, Vec<usize>)> {
    let mut index: HashMap<KeyId, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<usize>)> = Vec::new();
    for (r, row) in df.rows().iter().enumerate() {
        let value = &row[key_idx];
        if value.is_null() {
            continue;
        }
        let slot = *index.entry(KeyId::of(value)).or_insert_with(|| {
            groups.push((value.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(r);
    }
    groups.sort_by(|a, b| compare_keys(&a.0, &b.0));
    groups
}

/// Numbers sort before text, booleans before numbers; other values by JSON text.
fn compare_keys(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            _ => 3,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Min, max and mean of a group's cells. All null when the group has none.
fn aggregate_numbers(cells: &[&Number]) -> [Value; 3] {
    if cells.is_empty() {
        return [Value::Null, Value::Null, Value::Null];
    }
    let as_f64 = |n: &Number| n.as_f64().unwrap_or(0.0);

    let mut min = cells[0];
    let mut max = cells[0];
    let mut sum = 0.0;
    for &n in cells {
        if as_f64(n) < as_f64(min) {
            min = n;
        }
        if as_f64(n) > as_f64(max) {
            max = n;
        }
        sum += as_f64(n);
    }
    let mean = Number::from_f64(sum / cells.len() as f64)
        .map(Value::Number)
        .unwrap_or(Value::Null);

    [Value::Number(min.clone()), Value::Number(max.clone()), mean]
}
