//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O: clinical input, feature records and diagnoses.

mod clinical;
mod diagnosis;
mod features;

pub use clinical::{bounds, ClinicalInput, YesNo};
pub use diagnosis::{format_percent, BinaryPrediction, DiabetesType, Diagnosis, DiagnosisOutcome};
pub use features::{FeatureColumn, FeatureError, FeatureRecord, FeatureSet, NormalizedRecord};
