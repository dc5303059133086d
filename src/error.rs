//! Error types for stepgate operations.
//!
//! This module defines [`StepgateError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Graph errors (`DuplicateId`, `UnknownDependency`, `CyclicDependency`)
//!   are raised before any run starts
//! - Run errors abort the run and are returned alongside the partial report
//! - Step bodies return `anyhow::Result`; their failures are wrapped in
//!   `StepFailed` with the original error kept as the source

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stepgate operations.
#[derive(Debug, Error)]
pub enum StepgateError {
    /// A step with the same id is already registered.
    #[error("Duplicate step id: {id}")]
    DuplicateId { id: String },

    /// A step requires an id that is not registered.
    #[error("Step '{step}' depends on unknown step '{missing}'")]
    UnknownDependency { step: String, missing: String },

    /// Step dependency cycle detected.
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A step asked for a result that has not been produced in this run.
    #[error("Result for step '{id}' is not available")]
    ResultNotAvailable { id: String },

    /// A stored result was read back as the wrong type.
    #[error("Result for step '{id}' is not a {expected}")]
    ResultTypeMismatch { id: String, expected: &'static str },

    /// A check returned a result carrying another check's id.
    #[error("Check '{expected}' returned a result for '{actual}'")]
    CheckIdentityMismatch { expected: String, actual: String },

    /// A step was reached before one of its dependencies completed.
    #[error("Step '{step}' reached before its dependency '{dependency}' completed")]
    DependencyNotCompleted { step: String, dependency: String },

    /// A step body returned an error.
    #[error("Step '{id}' failed: {source:#}")]
    StepFailed {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A data source could not be read.
    #[error("Data source error: {message}")]
    DataSource { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepgateError {
    /// Whether this error signals a broken step contract rather than a
    /// failing body. Contract errors always abort the run, even inside a check.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            StepgateError::ResultNotAvailable { .. }
                | StepgateError::ResultTypeMismatch { .. }
                | StepgateError::CheckIdentityMismatch { .. }
                | StepgateError::DependencyNotCompleted { .. }
        )
    }

    /// Id of the step this error is about, if it names one.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            StepgateError::DuplicateId { id }
            | StepgateError::ResultNotAvailable { id }
            | StepgateError::ResultTypeMismatch { id, .. }
            | StepgateError::StepFailed { id, .. } => Some(id),
            StepgateError::UnknownDependency { step, .. }
            | StepgateError::DependencyNotCompleted { step, .. } => Some(step),
            StepgateError::CheckIdentityMismatch { expected, .. } => Some(expected),
            _ => None,
        }
    }
}

/// Result type alias for stepgate operations.
pub type Result<T> = std::result::Result<T, StepgateError>;
