//! Per-run context handed to every step.
//!
//! A [`RunContext`] carries the caller-supplied [`Env`] and [`Params`] plus
//! the results of steps that already completed in this run. Results are
//! type-erased; each consumer casts to the type it expects.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::error::{Result, StepgateError};
use crate::report::CheckResult;

/// A type-erased task output.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Run-scoped external resources, keyed by name.
///
/// Values are opaque to the engine. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Env {
    values: HashMap<String, Value>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, builder style.
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Get a resource, if present and of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Env").field("keys", &keys).finish()
    }
}

/// Run-scoped invocation parameters.
///
/// Lookups are lenient: a missing or mistyped optional parameter reads as
/// absent rather than failing the step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, serde_json::Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// A string parameter. Empty strings read as absent.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// A scalar parameter as text. Numbers and booleans are rendered, so
    /// `--param group_key=2020` names the column `2020`.
    pub fn text(&self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        let text = scalar_text(value);
        if text.is_none() && !value.is_null() {
            tracing::debug!(param = key, value = %value, "ignoring non-scalar parameter");
        }
        text
    }

    /// A list of strings. A single scalar is treated as a one-element list;
    /// numbers and booleans are rendered as text.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(serde_json::Value::Array(items)) => {
                items.iter().filter_map(scalar_text).collect()
            }
            Some(value) => scalar_text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Overlay `other` on top of these parameters.
    pub fn merge(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<Map<String, serde_json::Value>> for Params {
    fn from(map: Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

/// The per-execution handle through which a step reads its inputs.
///
/// Owned by exactly one run.
#[derive(Debug, Default)]
pub struct RunContext {
    env: Env,
    params: Params,
    results: HashMap<String, Value>,
    checks: HashMap<String, CheckResult>,
}

impl RunContext {
    pub fn new(env: Env, params: Params) -> Self {
        Self {
            env,
            params,
            results: HashMap::new(),
            checks: HashMap::new(),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Get the result of a task that completed earlier in this run.
    ///
    /// # Errors
    ///
    /// Returns `ResultNotAvailable` if the task has not run yet, and
    /// `ResultTypeMismatch` if its output is not a `T`.
    pub fn get<T: Any>(&self, id: &str) -> Result<&T> {
        let value = self
            .results
            .get(id)
            .ok_or_else(|| StepgateError::ResultNotAvailable { id: id.to_string() })?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| StepgateError::ResultTypeMismatch {
                id: id.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Get the recorded result of a check that completed earlier in this run.
    pub fn check_result(&self, id: &str) -> Result<&CheckResult> {
        self.checks
            .get(id)
            .ok_or_else(|| StepgateError::ResultNotAvailable { id: id.to_string() })
    }

    /// Whether a task or check with this id has completed in this run.
    pub fn is_completed(&self, id: &str) -> bool {
        self.results.contains_key(id) || self.checks.contains_key(id)
    }

    /// Ids of tasks that have stored a result.
    pub fn result_ids(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    /// Store a task's output. Each id can be written once per run.
    pub(crate) fn insert_result(&mut self, id: &str, value: Value) -> Result<()> {
        if self.is_completed(id) {
            return Err(StepgateError::DuplicateId { id: id.to_string() });
        }
        self.results.insert(id.to_string(), value);
        Ok(())
    }

    pub(crate) fn record_check(&mut self, result: CheckResult) {
        self.checks.insert(result.id.clone(), result);
    }
}
