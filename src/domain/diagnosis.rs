//! Diagnosis result types.
//!
//! Represents the output of the two-stage screening: diabetes presence from
//! the primary model and, for positive results, the diabetes type.

use serde::{Deserialize, Serialize};

/// Diabetes type predicted by the secondary model.
///
/// Built from the model's integer stage code. Codes outside the known set
/// are kept as [`DiabetesType::Unknown`] rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiabetesType {
    Gestational,
    Type1,
    Type2,
    Unknown(i64),
}

impl DiabetesType {
    /// Map a stage code to a diabetes type. Total over all integers.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Gestational,
            3 => Self::Type1,
            4 => Self::Type2,
            other => Self::Unknown(other),
        }
    }

    /// Human-readable subtype name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gestational => "Gestational Diabetes",
            Self::Type1 => "Type 1 Diabetes",
            Self::Type2 => "Type 2 Diabetes",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl std::fmt::Display for DiabetesType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Label and positive-class probability from one primary model call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryPrediction {
    /// Model label (0 = no diabetes, 1 = diabetes). Authoritative: never
    /// re-derived from `probability`.
    pub label: u8,

    /// Probability of label 1 (0.0 to 1.0)
    pub probability: f64,
}

impl BinaryPrediction {
    #[must_use]
    pub fn new(label: u8, probability: f64) -> Self {
        debug_assert!(label <= 1, "binary label must be 0 or 1");
        Self { label, probability }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.label == 1
    }

    /// Probability of the predicted outcome: `p` when positive, `1 - p`
    /// when negative.
    #[must_use]
    pub fn outcome_probability(&self) -> f64 {
        if self.is_positive() {
            self.probability
        } else {
            1.0 - self.probability
        }
    }
}

/// Terminal state of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DiagnosisOutcome {
    Negative,
    Positive {
        stage_code: i64,
        diabetes_type: DiabetesType,
    },
}

/// Complete diagnosis record for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    /// The primary model prediction
    pub prediction: BinaryPrediction,

    /// Negative, or positive with the predicted type
    pub outcome: DiagnosisOutcome,

    /// Timestamp of diagnosis
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Diagnosis {
    /// Diagnosis for a negative primary prediction.
    #[must_use]
    pub fn negative(prediction: BinaryPrediction) -> Self {
        Self {
            prediction,
            outcome: DiagnosisOutcome::Negative,
            created_at: chrono::Utc::now(),
        }
    }

    /// Diagnosis for a positive primary prediction and its stage code.
    #[must_use]
    pub fn positive(prediction: BinaryPrediction, stage_code: i64) -> Self {
        Self {
            prediction,
            outcome: DiagnosisOutcome::Positive {
                stage_code,
                diabetes_type: DiabetesType::from_code(stage_code),
            },
            created_at: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        matches!(self.outcome, DiagnosisOutcome::Positive { .. })
    }

    #[must_use]
    pub fn diabetes_type(&self) -> Option<DiabetesType> {
        match self.outcome {
            DiagnosisOutcome::Positive { diabetes_type, .. } => Some(diabetes_type),
            DiagnosisOutcome::Negative => None,
        }
    }

    /// "Diabetes Detected" or "No Diabetes Detected".
    #[must_use]
    pub fn headline(&self) -> &'static str {
        if self.is_positive() {
            "Diabetes Detected"
        } else {
            "No Diabetes Detected"
        }
    }

    /// Probability line for the predicted outcome.
    #[must_use]
    pub fn probability_line(&self) -> String {
        let subject = if self.is_positive() {
            "diabetes"
        } else {
            "no diabetes"
        };
        format!(
            "Probability of {subject}: {}",
            format_percent(self.prediction.outcome_probability())
        )
    }

    /// Subtype line, only for positive results.
    #[must_use]
    pub fn type_line(&self) -> Option<String> {
        self.diabetes_type()
            .map(|t| format!("Predicted Diabetes Type: {t}"))
    }

    /// All result lines in display order.
    #[must_use]
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![self.headline().to_string(), self.probability_line()];
        lines.extend(self.type_line());
        lines
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.report_lines().join("\n"))
    }
}

/// Format a probability as a percentage with two decimals (0.82 -> "82.00%").
#[must_use]
pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}
