//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: loading exported models by name, with optional digest checks
//! - `forest`: random forest inference (implements the classifier ports)
//! - `scaler`: standard scaler normalization

pub mod artifacts;
pub mod forest;
pub mod scaler;

pub use artifacts::{ArtifactError, ArtifactManifest, ArtifactStore};
pub use forest::{BinaryForest, DecisionTree, RandomForest, StageForest};
pub use scaler::StandardScaler;
