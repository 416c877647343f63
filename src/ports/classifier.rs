//! Classifier ports: traits for the two trained models.
//!
//! These traits abstract the model runtime (exported random forests) from
//! the screening pipeline, so the pipeline can be exercised with stub
//! models in tests.

use crate::domain::{BinaryPrediction, FeatureError, NormalizedRecord};

/// Binary model deciding diabetes presence.
///
/// Implementations provide:
/// - The ordered feature names the model was fitted on
/// - A label and the positive-class probability from a single evaluation
pub trait BinaryClassifier: Send + Sync {
    /// Ordered feature names the model expects.
    fn feature_names(&self) -> &[String];

    /// Predict the label and the probability of label 1.
    ///
    /// The label is the model's own decision; callers must not re-derive
    /// it from the probability.
    ///
    /// # Errors
    /// Returns `FeatureError::ShapeMismatch` if the record layout differs
    /// from `feature_names()`.
    fn predict(&self, record: &NormalizedRecord) -> Result<BinaryPrediction, FeatureError>;
}

/// Multi-class model predicting the diabetes type as an integer stage code.
pub trait StageClassifier: Send + Sync {
    /// Ordered feature names the model expects.
    fn feature_names(&self) -> &[String];

    /// Predict the stage code.
    ///
    /// # Errors
    /// Returns `FeatureError::ShapeMismatch` if the record layout differs
    /// from `feature_names()`.
    fn predict_stage(&self, record: &NormalizedRecord) -> Result<i64, FeatureError>;
}

/// Check a record against a model's expected feature names.
///
/// # Errors
/// Returns `FeatureError::ShapeMismatch` naming `context` on any difference
/// in count, names or order.
pub fn ensure_layout(
    context: &str,
    expected: &[String],
    record: &NormalizedRecord,
) -> Result<(), FeatureError> {
    let matches = expected.len() == record.set().len()
        && expected
            .iter()
            .zip(record.set().names())
            .all(|(e, a)| e == a);

    if matches {
        Ok(())
    } else {
        Err(FeatureError::shape_mismatch(
            context,
            expected,
            record.set().names(),
        ))
    }
}
