//! Clinical input types for diabetes screening.
//!
//! Mirrors the measurements collected on the screening form: glycaemic
//! markers, lipids, family/hypertension history and basic demographics.

use serde::{Deserialize, Serialize};

/// Answer to a Yes/No question on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YesNo {
    #[default]
    No,
    Yes,
}

impl YesNo {
    /// Numeric encoding used by the models: Yes = 1, No = 0.
    #[must_use]
    pub fn encode(self) -> f64 {
        match self {
            Self::Yes => 1.0,
            Self::No => 0.0,
        }
    }

    /// Flip the answer.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    /// Parse a selector label ("Yes" / "No", case-insensitive).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl std::fmt::Display for YesNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
        }
    }
}

/// Raw values entered for one prediction request.
///
/// Created per submission and dropped once the diagnosis is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInput {
    /// Glycated haemoglobin, % (4.0-12.0)
    pub hba1c: f64,

    /// Fasting plasma glucose, mg/dL (60-200)
    pub glucose_fasting: u32,

    /// Two-hour postprandial glucose, mg/dL (70-300)
    pub glucose_postprandial: u32,

    /// Fasting insulin (2.0-40.0)
    pub insulin_level: f64,

    /// Triglycerides, mg/dL (30-400)
    pub triglycerides: u32,

    /// First-degree relative with diabetes
    pub family_history_diabetes: YesNo,

    /// Previously diagnosed hypertension
    pub hypertension_history: YesNo,

    /// Age in years (18-100)
    pub age: u32,

    /// Body mass index (10.0-60.0)
    pub bmi: f64,
}

/// Input bounds enforced by the form widgets.
///
/// These are the only validation applied to clinical values; anything
/// that reaches the pipeline is assumed to be within range.
pub mod bounds {
    pub const HBA1C: (f64, f64) = (4.0, 12.0);
    pub const GLUCOSE_FASTING: (f64, f64) = (60.0, 200.0);
    pub const GLUCOSE_POSTPRANDIAL: (f64, f64) = (70.0, 300.0);
    pub const INSULIN_LEVEL: (f64, f64) = (2.0, 40.0);
    pub const TRIGLYCERIDES: (f64, f64) = (30.0, 400.0);
    pub const AGE: (f64, f64) = (18.0, 100.0);
    pub const BMI: (f64, f64) = (10.0, 60.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yes_no_encoding() {
        assert_eq!(YesNo::Yes.encode(), 1.0);
        assert_eq!(YesNo::No.encode(), 0.0);
        assert_eq!(YesNo::from(true), YesNo::Yes);
        assert_eq!(YesNo::No.toggled(), YesNo::Yes);
    }

    #[test]
    fn test_yes_no_from_label() {
        assert_eq!(YesNo::from_label("Yes"), Some(YesNo::Yes));
        assert_eq!(YesNo::from_label(" no "), Some(YesNo::No));
        assert_eq!(YesNo::from_label("maybe"), None);
    }
}
