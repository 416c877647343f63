//! Application layer: Use cases and services.
//!
//! Orchestrates domain logic with the classifier ports to implement the
//! screening use case.

mod pipeline;

pub use pipeline::{DiagnosisPipeline, PipelineRun, PipelineStage};
