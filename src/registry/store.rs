//! Step registry.
//!
//! The [`Registry`] stores all declared steps in registration order.
//! It is append-only and owned by the caller; there is no process-wide
//! registry.

use std::collections::HashMap;

use super::step::Step;
use crate::error::{Result, StepgateError};

/// Registry of declared steps.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    steps: Vec<Step>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step.
    ///
    /// Tasks and checks share one id namespace.
    pub fn register(&mut self, step: Step) -> Result<()> {
        if self.index.contains_key(step.id()) {
            return Err(StepgateError::DuplicateId {
                id: step.id().to_string(),
            });
        }
        tracing::debug!(step = step.id(), kind = %step.kind(), "registered step");
        self.index.insert(step.id().to_string(), self.steps.len());
        self.steps.push(step);
        Ok(())
    }

    /// Get a step by id.
    pub fn get(&self, id: &str) -> Option<&Step> {
        self.index.get(id).map(|&i| &self.steps[i])
    }

    /// Check if a step id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All steps, in registration order.
    pub fn all(&self) -> &[Step] {
        &self.steps
    }

    /// Get the number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
