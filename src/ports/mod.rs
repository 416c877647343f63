//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the screening pipeline and the trained model runtime.

mod classifier;

pub use classifier::{ensure_layout, BinaryClassifier, StageClassifier};
