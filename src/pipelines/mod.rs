//! Ready-made pipelines built on the step registry.

pub mod quality;
