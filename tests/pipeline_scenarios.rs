//! End-to-end screening scenarios through the public API.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glycosense::adapters::artifacts::{ARTIFACT_FILES, MANIFEST_FILE};
use glycosense::adapters::{ArtifactError, ArtifactManifest, ArtifactStore, StandardScaler};
use glycosense::domain::{BinaryPrediction, FeatureError, FeatureSet, NormalizedRecord};
use glycosense::ports::{BinaryClassifier, StageClassifier};
use glycosense::{
    ClinicalInput, DiabetesType, DiagnosisPipeline, GlycosenseError, PipelineStage, YesNo,
};

struct StubDetector {
    names: Vec<String>,
    label: u8,
    probability: f64,
}

impl BinaryClassifier for StubDetector {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict(&self, _record: &NormalizedRecord) -> Result<BinaryPrediction, FeatureError> {
        Ok(BinaryPrediction::new(self.label, self.probability))
    }
}

struct StubTyper {
    names: Vec<String>,
    code: i64,
    calls: AtomicUsize,
}

impl StageClassifier for StubTyper {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict_stage(&self, _record: &NormalizedRecord) -> Result<i64, FeatureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.code)
    }
}

fn names(set: FeatureSet) -> Vec<String> {
    set.names().map(String::from).collect()
}

fn stub_pipeline(
    label: u8,
    probability: f64,
    code: i64,
) -> (DiagnosisPipeline<StubDetector, StubTyper>, Arc<StubTyper>) {
    let typer = Arc::new(StubTyper {
        names: names(FeatureSet::Secondary),
        code,
        calls: AtomicUsize::new(0),
    });
    let pipeline = DiagnosisPipeline::new(
        StandardScaler::identity(FeatureSet::Primary),
        Arc::new(StubDetector {
            names: names(FeatureSet::Primary),
            label,
            probability,
        }),
        StandardScaler::identity(FeatureSet::Secondary),
        Arc::clone(&typer),
    )
    .expect("stub layouts fit");
    (pipeline, typer)
}

fn healthy_input() -> ClinicalInput {
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

fn high_risk_input() -> ClinicalInput {
    ClinicalInput {
        hba1c: 9.0,
        glucose_fasting: 180,
        glucose_postprandial: 260,
        insulin_level: 22.0,
        triglycerides: 250,
        family_history_diabetes: YesNo::Yes,
        hypertension_history: YesNo::Yes,
        age: 58,
        bmi: 34.0,
    }
}

fn bundled_models() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models")
}

#[test]
fn negative_prediction_reports_complement_and_skips_type_model() {
    let (pipeline, typer) = stub_pipeline(0, 0.1, 4);
    let run = pipeline.run_traced(&healthy_input()).expect("run");

    assert_eq!(run.diagnosis.headline(), "No Diabetes Detected");
    assert_eq!(
        run.diagnosis.probability_line(),
        "Probability of no diabetes: 90.00%"
    );
    assert!(run.diagnosis.type_line().is_none());
    assert_eq!(typer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(run.trace.last(), Some(&PipelineStage::Negative));
}

#[test]
fn positive_prediction_reports_type() {
    let (pipeline, typer) = stub_pipeline(1, 0.82, 4);
    let diagnosis = pipeline.run(&healthy_input()).expect("run");

    assert_eq!(
        diagnosis.report_lines(),
        vec![
            "Diabetes Detected".to_string(),
            "Probability of diabetes: 82.00%".to_string(),
            "Predicted Diabetes Type: Type 2 Diabetes".to_string(),
        ]
    );
    assert_eq!(typer.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn unmapped_stage_code_is_unknown() {
    let (pipeline, _) = stub_pipeline(1, 0.9, 7);
    let diagnosis = pipeline.run(&healthy_input()).expect("run");

    assert_eq!(diagnosis.diabetes_type(), Some(DiabetesType::Unknown(7)));
    assert_eq!(
        diagnosis.type_line().as_deref(),
        Some("Predicted Diabetes Type: Unknown")
    );
}

#[test]
fn bundled_models_screen_healthy_input_negative() {
    let store = ArtifactStore::open(&bundled_models(), false).expect("open");
    let pipeline = DiagnosisPipeline::from_store(&store).expect("load");

    let diagnosis = pipeline.run(&healthy_input()).expect("run");
    assert!(!diagnosis.is_positive());
    assert_eq!(
        diagnosis.probability_line(),
        "Probability of no diabetes: 76.67%"
    );
}

#[test]
fn bundled_models_type_high_risk_input() {
    let store = ArtifactStore::open(&bundled_models(), false).expect("open");
    let pipeline = DiagnosisPipeline::from_store(&store).expect("load");

    let run = pipeline.run_traced(&high_risk_input()).expect("run");
    assert!(run.ran_secondary());
    assert_eq!(
        run.diagnosis.probability_line(),
        "Probability of diabetes: 87.33%"
    );
    assert_eq!(run.diagnosis.diabetes_type(), Some(DiabetesType::Type2));
}

#[test]
fn bundled_models_type_young_lean_patient() {
    let store = ArtifactStore::open(&bundled_models(), false).expect("open");
    let pipeline = DiagnosisPipeline::from_store(&store).expect("load");

    let input = ClinicalInput {
        hba1c: 10.0,
        glucose_fasting: 190,
        glucose_postprandial: 280,
        insulin_level: 4.0,
        triglycerides: 120,
        family_history_diabetes: YesNo::No,
        hypertension_history: YesNo::No,
        age: 22,
        bmi: 20.0,
    };
    let diagnosis = pipeline.run(&input).expect("run");
    assert_eq!(diagnosis.diabetes_type(), Some(DiabetesType::Type1));
}

fn copy_models(dir: &Path) {
    for name in ARTIFACT_FILES {
        std::fs::copy(bundled_models().join(name), dir.join(name)).expect("copy artifact");
    }
}

#[test]
fn manifest_verifies_and_detects_tampering() {
    let dir = tempfile::tempdir().expect("tempdir");
    copy_models(dir.path());

    let manifest = ArtifactManifest::build(dir.path(), Some(0)).expect("build");
    std::fs::write(
        dir.path().join(MANIFEST_FILE),
        serde_json::to_vec_pretty(&manifest).expect("serialize"),
    )
    .expect("write manifest");

    let store = ArtifactStore::open(dir.path(), true).expect("open");
    assert!(store.is_verified());
    DiagnosisPipeline::from_store(&store).expect("verified load");

    // Same structure, different bytes.
    let scaler = dir.path().join(ARTIFACT_FILES[0]);
    let mut bytes = std::fs::read(&scaler).expect("read");
    bytes.push(b'\n');
    std::fs::write(&scaler, bytes).expect("write");

    let err = DiagnosisPipeline::from_store(&store)
        .err()
        .expect("tampered artifact rejected");
    assert!(matches!(
        err,
        GlycosenseError::Artifact(ArtifactError::IntegrityMismatch { .. })
    ));
}

#[test]
fn required_manifest_must_exist() {
    let dir = tempfile::tempdir().expect("tempdir");
    copy_models(dir.path());

    let err = ArtifactStore::open(dir.path(), true)
        .err()
        .expect("manifest required");
    assert!(matches!(err, ArtifactError::Manifest(_)));
}

#[test]
fn missing_artifact_aborts_loading() {
    let dir = tempfile::tempdir().expect("tempdir");
    copy_models(dir.path());
    std::fs::remove_file(dir.path().join(ARTIFACT_FILES[3])).expect("remove");

    let store = ArtifactStore::open(dir.path(), false).expect("open");
    let err = DiagnosisPipeline::from_store(&store)
        .err()
        .expect("missing artifact");
    assert!(matches!(
        err,
        GlycosenseError::Artifact(ArtifactError::Missing { .. })
    ));
}
