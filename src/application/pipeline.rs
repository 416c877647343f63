//! Screening pipeline: Orchestrates the two-stage diagnosis.
//!
//! One submission runs one synchronous pass:
//!
//! ```text
//! Idle -> Assembling -> NormalizingPrimary -> ClassifyingPrimary
//!      -> Negative                                  (label 0)
//!      -> AssemblingSecondary -> NormalizingSecondary
//!         -> ClassifyingSecondary -> MappingStage -> Positive   (label 1)
//! ```
//!
//! Artifacts are injected at construction and shared read-only, so a
//! pipeline can be used from several threads at once.

use std::sync::Arc;

use crate::adapters::artifacts::{PRIMARY_MODEL, PRIMARY_SCALER, SECONDARY_MODEL, SECONDARY_SCALER};
use crate::adapters::{ArtifactError, ArtifactStore, BinaryForest, StageForest, StandardScaler};
use crate::domain::{
    BinaryPrediction, ClinicalInput, Diagnosis, FeatureError, FeatureRecord, FeatureSet,
    NormalizedRecord,
};
use crate::ports::{BinaryClassifier, StageClassifier};
use crate::GlycosenseError;

/// States of one prediction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Assembling,
    NormalizingPrimary,
    ClassifyingPrimary,
    /// Terminal: primary label 0
    Negative,
    AssemblingSecondary,
    NormalizingSecondary,
    ClassifyingSecondary,
    MappingStage,
    /// Terminal: primary label 1, type mapped
    Positive,
}

/// A completed pass: the diagnosis and the states visited, in order.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub diagnosis: Diagnosis,
    pub trace: Vec<PipelineStage>,
}

impl PipelineRun {
    /// Whether the type model ran during this pass.
    #[must_use]
    pub fn ran_secondary(&self) -> bool {
        self.trace.contains(&PipelineStage::ClassifyingSecondary)
    }
}

/// State with the data it carries into the next transition.
enum Step {
    Assembling,
    NormalizingPrimary(FeatureRecord),
    ClassifyingPrimary(NormalizedRecord),
    AssemblingSecondary(BinaryPrediction),
    NormalizingSecondary(BinaryPrediction, FeatureRecord),
    ClassifyingSecondary(BinaryPrediction, NormalizedRecord),
    MappingStage(BinaryPrediction, i64),
    Done(Diagnosis),
}

impl Step {
    fn stage(&self) -> PipelineStage {
        match self {
            Self::Assembling => PipelineStage::Assembling,
            Self::NormalizingPrimary(_) => PipelineStage::NormalizingPrimary,
            Self::ClassifyingPrimary(_) => PipelineStage::ClassifyingPrimary,
            Self::AssemblingSecondary(_) => PipelineStage::AssemblingSecondary,
            Self::NormalizingSecondary(..) => PipelineStage::NormalizingSecondary,
            Self::ClassifyingSecondary(..) => PipelineStage::ClassifyingSecondary,
            Self::MappingStage(..) => PipelineStage::MappingStage,
            Self::Done(d) if d.is_positive() => PipelineStage::Positive,
            Self::Done(_) => PipelineStage::Negative,
        }
    }
}

/// Two-stage diagnosis over injected, immutable artifacts.
pub struct DiagnosisPipeline<P, S>
where
    P: BinaryClassifier,
    S: StageClassifier,
{
    primary_scaler: Arc<StandardScaler>,
    primary: Arc<P>,
    secondary_scaler: Arc<StandardScaler>,
    secondary: Arc<S>,
}

impl<P, S> Clone for DiagnosisPipeline<P, S>
where
    P: BinaryClassifier,
    S: StageClassifier,
{
    fn clone(&self) -> Self {
        Self {
            primary_scaler: Arc::clone(&self.primary_scaler),
            primary: Arc::clone(&self.primary),
            secondary_scaler: Arc::clone(&self.secondary_scaler),
            secondary: Arc::clone(&self.secondary),
        }
    }
}

impl<P, S> DiagnosisPipeline<P, S>
where
    P: BinaryClassifier,
    S: StageClassifier,
{
    /// Wire the pipeline, checking every scaler and model against the
    /// feature layout it will receive.
    ///
    /// # Errors
    /// Returns `GlycosenseError::Artifact` if a scaler is structurally
    /// invalid, or `GlycosenseError::Shape` if any artifact was fitted on a
    /// different feature layout.
    pub fn new(
        primary_scaler: StandardScaler,
        primary: Arc<P>,
        secondary_scaler: StandardScaler,
        secondary: Arc<S>,
    ) -> Result<Self, GlycosenseError> {
        check_scaler(PRIMARY_SCALER, &primary_scaler)?;
        check_scaler(SECONDARY_SCALER, &secondary_scaler)?;
        primary_scaler.ensure_fits(FeatureSet::Primary)?;
        secondary_scaler.ensure_fits(FeatureSet::Secondary)?;
        ensure_model_layout("primary classifier", primary.feature_names(), FeatureSet::Primary)?;
        ensure_model_layout(
            "secondary classifier",
            secondary.feature_names(),
            FeatureSet::Secondary,
        )?;

        Ok(Self {
            primary_scaler: Arc::new(primary_scaler),
            primary,
            secondary_scaler: Arc::new(secondary_scaler),
            secondary,
        })
    }

    /// Run one prediction.
    ///
    /// # Errors
    /// Returns error if a record does not match a scaler or model layout.
    pub fn run(&self, input: &ClinicalInput) -> Result<Diagnosis, GlycosenseError> {
        self.run_traced(input).map(|run| run.diagnosis)
    }

    /// Run one prediction and return the visited states with the result.
    ///
    /// # Errors
    /// Returns error if a record does not match a scaler or model layout.
    pub fn run_traced(&self, input: &ClinicalInput) -> Result<PipelineRun, GlycosenseError> {
        let mut trace = vec![PipelineStage::Idle];
        let mut step = Step::Assembling;

        loop {
            let stage = step.stage();
            tracing::debug!(?stage, "pipeline transition");
            trace.push(stage);

            step = match step {
                Step::Assembling => {
                    Step::NormalizingPrimary(FeatureRecord::assemble(input, FeatureSet::Primary))
                }
                Step::NormalizingPrimary(record) => {
                    Step::ClassifyingPrimary(self.primary_scaler.transform(&record)?)
                }
                Step::ClassifyingPrimary(record) => {
                    let prediction = self.primary.predict(&record)?;
                    if prediction.is_positive() {
                        Step::AssemblingSecondary(prediction)
                    } else {
                        Step::Done(Diagnosis::negative(prediction))
                    }
                }
                Step::AssemblingSecondary(prediction) => Step::NormalizingSecondary(
                    prediction,
                    FeatureRecord::assemble(input, FeatureSet::Secondary),
                ),
                Step::NormalizingSecondary(prediction, record) => Step::ClassifyingSecondary(
                    prediction,
                    self.secondary_scaler.transform(&record)?,
                ),
                Step::ClassifyingSecondary(prediction, record) => {
                    Step::MappingStage(prediction, self.secondary.predict_stage(&record)?)
                }
                Step::MappingStage(prediction, code) => {
                    Step::Done(Diagnosis::positive(prediction, code))
                }
                Step::Done(diagnosis) => {
                    tracing::info!(
                        "Prediction complete: outcome={}, probability={:.4}",
                        diagnosis.headline(),
                        diagnosis.prediction.probability
                    );
                    return Ok(PipelineRun { diagnosis, trace });
                }
            };
        }
    }
}

impl DiagnosisPipeline<BinaryForest, StageForest> {
    /// Load the four artifacts from a store and wire them.
    ///
    /// # Errors
    /// Returns error if any artifact fails to load or does not fit its
    /// feature layout.
    pub fn from_store(store: &ArtifactStore) -> Result<Self, GlycosenseError> {
        tracing::info!("Loading artifacts from {:?}...", store.dir());

        let primary_scaler = store.load_scaler(PRIMARY_SCALER)?;
        let primary = store.load_binary_forest(PRIMARY_MODEL)?;
        let secondary_scaler = store.load_scaler(SECONDARY_SCALER)?;
        let secondary = store.load_stage_forest(SECONDARY_MODEL)?;

        Self::new(
            primary_scaler,
            Arc::new(primary),
            secondary_scaler,
            Arc::new(secondary),
        )
    }
}

fn check_scaler(name: &str, scaler: &StandardScaler) -> Result<(), ArtifactError> {
    scaler.validate().map_err(|reason| ArtifactError::Corrupt {
        name: name.to_string(),
        reason,
    })
}

fn ensure_model_layout(
    context: &str,
    expected: &[String],
    set: FeatureSet,
) -> Result<(), FeatureError> {
    let fits = expected.len() == set.len() && expected.iter().zip(set.names()).all(|(e, a)| e == a);
    if fits {
        Ok(())
    } else {
        Err(FeatureError::shape_mismatch(context, set.names(), expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DiabetesType, YesNo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedBinary {
        names: Vec<String>,
        prediction: BinaryPrediction,
        calls: AtomicUsize,
    }

    impl FixedBinary {
        fn new(label: u8, probability: f64) -> Self {
            Self {
                names: FeatureSet::Primary.names().map(str::to_string).collect(),
                prediction: BinaryPrediction::new(label, probability),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl BinaryClassifier for FixedBinary {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, _record: &NormalizedRecord) -> Result<BinaryPrediction, FeatureError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.prediction)
        }
    }

    struct FixedStage {
        names: Vec<String>,
        code: i64,
        calls: AtomicUsize,
    }

    impl FixedStage {
        fn new(code: i64) -> Self {
            Self {
                names: FeatureSet::Secondary.names().map(str::to_string).collect(),
                code,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl StageClassifier for FixedStage {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_stage(&self, record: &NormalizedRecord) -> Result<i64, FeatureError> {
            assert_eq!(record.set(), FeatureSet::Secondary);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.code)
        }
    }

    fn scenario_input() -> ClinicalInput {
        ClinicalInput {
            hba1c: 5.0,
            glucose_fasting: 90,
            glucose_postprandial: 110,
            insulin_level: 10.0,
            triglycerides: 100,
            family_history_diabetes: YesNo::No,
            hypertension_history: YesNo::No,
            age: 30,
            bmi: 22.0,
        }
    }

    fn pipeline(
        primary: Arc<FixedBinary>,
        secondary: Arc<FixedStage>,
    ) -> DiagnosisPipeline<FixedBinary, FixedStage> {
        DiagnosisPipeline::new(
            StandardScaler::identity(FeatureSet::Primary),
            primary,
            StandardScaler::identity(FeatureSet::Secondary),
            secondary,
        )
        .expect("layouts fit")
    }

    #[test]
    fn test_negative_skips_secondary() {
        let primary = Arc::new(FixedBinary::new(0, 0.1));
        let secondary = Arc::new(FixedStage::new(4));
        let run = pipeline(primary.clone(), secondary.clone())
            .run_traced(&scenario_input())
            .expect("run");

        assert_eq!(
            run.trace,
            vec![
                PipelineStage::Idle,
                PipelineStage::Assembling,
                PipelineStage::NormalizingPrimary,
                PipelineStage::ClassifyingPrimary,
                PipelineStage::Negative,
            ]
        );
        assert!(!run.ran_secondary());
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);

        assert_eq!(run.diagnosis.headline(), "No Diabetes Detected");
        assert_eq!(
            run.diagnosis.probability_line(),
            "Probability of no diabetes: 90.00%"
        );
    }

    #[test]
    fn test_positive_runs_secondary_once() {
        let primary = Arc::new(FixedBinary::new(1, 0.82));
        let secondary = Arc::new(FixedStage::new(4));
        let run = pipeline(primary, secondary.clone())
            .run_traced(&scenario_input())
            .expect("run");

        assert_eq!(
            run.trace,
            vec![
                PipelineStage::Idle,
                PipelineStage::Assembling,
                PipelineStage::NormalizingPrimary,
                PipelineStage::ClassifyingPrimary,
                PipelineStage::AssemblingSecondary,
                PipelineStage::NormalizingSecondary,
                PipelineStage::ClassifyingSecondary,
                PipelineStage::MappingStage,
                PipelineStage::Positive,
            ]
        );
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            run.diagnosis.report_lines(),
            vec![
                "Diabetes Detected".to_string(),
                "Probability of diabetes: 82.00%".to_string(),
                "Predicted Diabetes Type: Type 2 Diabetes".to_string(),
            ]
        );
    }

    #[test]
    fn test_unmapped_stage_code_is_unknown() {
        let diagnosis = pipeline(
            Arc::new(FixedBinary::new(1, 0.9)),
            Arc::new(FixedStage::new(7)),
        )
        .run(&scenario_input())
        .expect("run");

        assert_eq!(diagnosis.diabetes_type(), Some(DiabetesType::Unknown(7)));
        assert_eq!(
            diagnosis.type_line().as_deref(),
            Some("Predicted Diabetes Type: Unknown")
        );
    }

    #[test]
    fn test_label_is_authoritative_over_probability() {
        // A model with a non-0.5 decision threshold may say "positive" at 0.3.
        let diagnosis = pipeline(
            Arc::new(FixedBinary::new(1, 0.3)),
            Arc::new(FixedStage::new(3)),
        )
        .run(&scenario_input())
        .expect("run");

        assert!(diagnosis.is_positive());
        assert_eq!(diagnosis.probability_line(), "Probability of diabetes: 30.00%");
    }

    #[test]
    fn test_wiring_rejects_swapped_scalers() {
        let result = DiagnosisPipeline::new(
            StandardScaler::identity(FeatureSet::Secondary),
            Arc::new(FixedBinary::new(0, 0.1)),
            StandardScaler::identity(FeatureSet::Primary),
            Arc::new(FixedStage::new(0)),
        );
        assert!(matches!(result, Err(GlycosenseError::Shape(_))));
    }

    #[test]
    fn test_wiring_rejects_scaler_with_missing_parameters() {
        let mut primary_scaler = StandardScaler::identity(FeatureSet::Primary);
        primary_scaler.center.truncate(1);
        primary_scaler.center[0] = 100.0;

        let primary = Arc::new(FixedBinary::new(1, 0.9));
        let result = DiagnosisPipeline::new(
            primary_scaler,
            Arc::clone(&primary),
            StandardScaler::identity(FeatureSet::Secondary),
            Arc::new(FixedStage::new(4)),
        );

        match result.err().expect("must fail") {
            GlycosenseError::Artifact(ArtifactError::Corrupt { name, .. }) => {
                assert_eq!(name, PRIMARY_SCALER);
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wiring_rejects_model_with_wrong_features() {
        let mut primary = FixedBinary::new(0, 0.1);
        primary.names.reverse();
        let result = DiagnosisPipeline::new(
            StandardScaler::identity(FeatureSet::Primary),
            Arc::new(primary),
            StandardScaler::identity(FeatureSet::Secondary),
            Arc::new(FixedStage::new(0)),
        );
        let err = result.err().expect("must fail");
        assert!(err.to_string().contains("primary classifier"));
    }

    #[test]
    fn test_concurrent_runs_share_artifacts() {
        let secondary = Arc::new(FixedStage::new(0));
        let shared = Arc::new(pipeline(Arc::new(FixedBinary::new(1, 0.7)), secondary.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pipeline = Arc::clone(&shared);
                std::thread::spawn(move || pipeline.run(&scenario_input()))
            })
            .collect();

        for handle in handles {
            let diagnosis = handle.join().expect("thread").expect("run");
            assert_eq!(diagnosis.diabetes_type(), Some(DiabetesType::Gestational));
        }
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 8);
    }
}
