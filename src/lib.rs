//! # Glycosense
//!
//! Two-stage diabetes screening over exported random forest models.
//!
//! This crate provides:
//! - Feature assembly and standard-scaler normalization for clinical input
//! - A detection model (diabetes yes/no) and, on positive results, a type model
//! - Terminal UI form for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (clinical input, feature records, diagnosis)
//! - `ports`: Classifier traits
//! - `adapters`: Artifact loading, random forests, scalers
//! - `application`: The screening pipeline state machine
//! - `config`: Environment configuration
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::{DiagnosisPipeline, PipelineRun, PipelineStage};
pub use domain::{ClinicalInput, DiabetesType, Diagnosis, YesNo};

/// Result type for Glycosense operations
pub type Result<T> = std::result::Result<T, GlycosenseError>;

/// Main error type for Glycosense
#[derive(Debug, thiserror::Error)]
pub enum GlycosenseError {
    #[error("Artifact load failed: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("{0}")]
    Shape(#[from] domain::FeatureError),
}
