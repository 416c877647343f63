//! Standard scaler adapter: per-feature affine normalization.
//!
//! Holds the `mean_` / `scale_` vectors of a fitted scikit-learn
//! `StandardScaler`, exported to JSON by the training pipeline.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureError, FeatureRecord, FeatureSet, NormalizedRecord};

/// Scaler parameters as exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Ordered names of the columns the scaler was fitted on.
    pub feature_names: Vec<String>,

    /// Per-feature center (`mean_`).
    #[serde(alias = "mean")]
    pub center: Vec<f64>,

    /// Per-feature scale (`scale_`).
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Scaler that leaves every scaled column of `set` unchanged.
    #[must_use]
    pub fn identity(set: FeatureSet) -> Self {
        let feature_names: Vec<String> = set.scaled_names().map(str::to_string).collect();
        let n = feature_names.len();
        Self {
            feature_names,
            center: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    /// Structural checks applied when the artifact is loaded.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err("scaler has no features".into());
        }
        if self.center.len() != n || self.scale.len() != n {
            return Err(format!(
                "parameter lengths do not match feature_names length ({n}): center={}, scale={}",
                self.center.len(),
                self.scale.len()
            ));
        }
        if let Some(i) = self.center.iter().position(|c| !c.is_finite()) {
            return Err(format!("center for {} is not finite", self.feature_names[i]));
        }
        if let Some(i) = self
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(format!(
                "scale for {} must be finite and non-zero",
                self.feature_names[i]
            ));
        }
        Ok(())
    }

    /// Check that this scaler was fitted on exactly the scaled columns of
    /// `set`, in order.
    ///
    /// # Errors
    /// Returns `FeatureError::ShapeMismatch` otherwise.
    pub fn ensure_fits(&self, set: FeatureSet) -> Result<(), FeatureError> {
        let fits = self.feature_names.len() == set.scaled_names().count()
            && self
                .feature_names
                .iter()
                .zip(set.scaled_names())
                .all(|(a, b)| a == b);

        if fits {
            Ok(())
        } else {
            Err(FeatureError::shape_mismatch(
                format!("{set} scaler"),
                set.scaled_names(),
                &self.feature_names,
            ))
        }
    }

    /// Normalize a record: `(value - center) / scale` for each scaled
    /// column; passthrough columns are copied unchanged.
    ///
    /// # Errors
    /// Returns `FeatureError::ShapeMismatch` if the scaler does not fit the
    /// record's feature set or has fewer parameters than scaled columns.
    pub fn transform(&self, record: &FeatureRecord) -> Result<NormalizedRecord, FeatureError> {
        self.ensure_fits(record.set())?;

        let mut params = self.center.iter().zip(self.scale.iter());
        let values = record
            .iter()
            .map(|(column, value)| {
                if !column.scaled {
                    return Ok(value);
                }
                params
                    .next()
                    .map(|(center, scale)| (value - center) / scale)
                    .ok_or_else(|| self.missing_parameters(record.set()))
            })
            .collect::<Result<Vec<f64>, FeatureError>>()?;

        Ok(FeatureRecord::normalized(record.set(), values))
    }

    fn missing_parameters(&self, set: FeatureSet) -> FeatureError {
        let fitted = self.center.len().min(self.scale.len());
        FeatureError::shape_mismatch(
            format!("{set} scaler parameters"),
            &self.feature_names,
            self.feature_names.iter().take(fitted),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClinicalInput, YesNo};

    fn input() -> ClinicalInput {
        ClinicalInput {
            hba1c: 7.0,
            glucose_fasting: 150,
            glucose_postprandial: 200,
            insulin_level: 12.5,
            triglycerides: 180,
            family_history_diabetes: YesNo::Yes,
            hypertension_history: YesNo::No,
            age: 45,
            bmi: 31.0,
        }
    }

    #[test]
    fn test_identity_scaler_is_noop() {
        for set in [FeatureSet::Primary, FeatureSet::Secondary] {
            let record = FeatureRecord::assemble(&input(), set);
            let normalized = StandardScaler::identity(set)
                .transform(&record)
                .expect("identity scaler fits");
            assert_eq!(normalized.values(), record.values());
        }
    }

    #[test]
    fn test_affine_transform_skips_passthrough_columns() {
        let mut scaler = StandardScaler::identity(FeatureSet::Primary);
        // hba1c is column 0 of both the scaler and the record.
        scaler.center[0] = 6.0;
        scaler.scale[0] = 2.0;
        // age is scaled column 5 (after the two passthrough columns are skipped).
        scaler.center[5] = 40.0;
        scaler.scale[5] = 10.0;

        let record = FeatureRecord::assemble(&input(), FeatureSet::Primary);
        let normalized = scaler.transform(&record).expect("fits");

        assert!((normalized.get("hba1c").unwrap() - 0.5).abs() < 1e-12);
        assert!((normalized.get("age").unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(normalized.get("family_history_diabetes"), Some(1.0));
        assert_eq!(normalized.get("hypertension_history"), Some(0.0));
    }

    #[test]
    fn test_wrong_feature_set_is_shape_mismatch() {
        let scaler = StandardScaler::identity(FeatureSet::Secondary);
        let record = FeatureRecord::assemble(&input(), FeatureSet::Primary);
        let err = scaler.transform(&record).expect_err("must not fit");
        assert!(matches!(err, FeatureError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reordered_features_are_rejected() {
        let mut scaler = StandardScaler::identity(FeatureSet::Secondary);
        scaler.feature_names.swap(4, 5);
        assert!(scaler.ensure_fits(FeatureSet::Secondary).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(StandardScaler::identity(FeatureSet::Primary).validate().is_ok());

        let mut zero_scale = StandardScaler::identity(FeatureSet::Primary);
        zero_scale.scale[2] = 0.0;
        assert!(zero_scale.validate().unwrap_err().contains("glucose_postprandial"));

        let mut short = StandardScaler::identity(FeatureSet::Primary);
        short.center.pop();
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_truncated_parameters_are_shape_mismatch() {
        let mut scaler = StandardScaler::identity(FeatureSet::Primary);
        scaler.center.truncate(1);

        let record = FeatureRecord::assemble(&input(), FeatureSet::Primary);
        match scaler.transform(&record) {
            Err(FeatureError::ShapeMismatch { context, actual, .. }) => {
                assert_eq!(context, "primary scaler parameters");
                assert_eq!(actual, vec!["hba1c".to_string()]);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_mean_alias() {
        let json = r#"{"feature_names":["a"],"mean":[1.5],"scale":[2.0]}"#;
        let scaler: StandardScaler = serde_json::from_str(json).expect("parse");
        assert_eq!(scaler.center, vec![1.5]);
    }
}
