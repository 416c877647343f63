//! Feature records fed to the scalers and classifiers.
//!
//! Each model was fitted on a fixed, ordered set of named columns. A
//! [`FeatureSet`] describes that layout and [`FeatureRecord::assemble`]
//! builds a record in exactly that order from a [`ClinicalInput`].

use super::clinical::ClinicalInput;

/// Error type for feature layout violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

impl FeatureError {
    pub(crate) fn shape_mismatch<E, A>(context: impl Into<String>, expected: E, actual: A) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.into_iter().map(|s| s.as_ref().to_string()).collect(),
            actual: actual.into_iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}

/// One named column of a feature set.
#[derive(Debug, Clone, Copy)]
pub struct FeatureColumn {
    pub name: &'static str,
    /// Whether the fitted scaler covers this column. Encoded yes/no
    /// columns pass through unscaled.
    pub scaled: bool,
    extract: fn(&ClinicalInput) -> f64,
}

const fn scaled(name: &'static str, extract: fn(&ClinicalInput) -> f64) -> FeatureColumn {
    FeatureColumn {
        name,
        scaled: true,
        extract,
    }
}

const fn passthrough(name: &'static str, extract: fn(&ClinicalInput) -> f64) -> FeatureColumn {
    FeatureColumn {
        name,
        scaled: false,
        extract,
    }
}

fn hba1c(i: &ClinicalInput) -> f64 {
    i.hba1c
}
fn glucose_fasting(i: &ClinicalInput) -> f64 {
    f64::from(i.glucose_fasting)
}
fn glucose_postprandial(i: &ClinicalInput) -> f64 {
    f64::from(i.glucose_postprandial)
}
fn insulin_level(i: &ClinicalInput) -> f64 {
    i.insulin_level
}
fn triglycerides(i: &ClinicalInput) -> f64 {
    f64::from(i.triglycerides)
}
fn family_history_diabetes(i: &ClinicalInput) -> f64 {
    i.family_history_diabetes.encode()
}
fn hypertension_history(i: &ClinicalInput) -> f64 {
    i.hypertension_history.encode()
}
fn age(i: &ClinicalInput) -> f64 {
    f64::from(i.age)
}
fn bmi(i: &ClinicalInput) -> f64 {
    i.bmi
}

/// Column layout of the diabetes detection model.
static PRIMARY_COLUMNS: [FeatureColumn; 9] = [
    scaled("hba1c", hba1c),
    scaled("glucose_fasting", glucose_fasting),
    scaled("glucose_postprandial", glucose_postprandial),
    scaled("insulin_level", insulin_level),
    scaled("triglycerides", triglycerides),
    passthrough("family_history_diabetes", family_history_diabetes),
    passthrough("hypertension_history", hypertension_history),
    scaled("age", age),
    scaled("bmi", bmi),
];

/// Column layout of the diabetes type model.
static SECONDARY_COLUMNS: [FeatureColumn; 6] = [
    scaled("hba1c", hba1c),
    scaled("glucose_fasting", glucose_fasting),
    scaled("glucose_postprandial", glucose_postprandial),
    scaled("insulin_level", insulin_level),
    scaled("bmi", bmi),
    scaled("age", age),
];

/// Which model a record is assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSet {
    /// Diabetes present / absent
    Primary,
    /// Diabetes type, only after a positive primary result
    Secondary,
}

impl FeatureSet {
    /// Ordered columns of this set.
    #[must_use]
    pub fn columns(self) -> &'static [FeatureColumn] {
        match self {
            Self::Primary => &PRIMARY_COLUMNS,
            Self::Secondary => &SECONDARY_COLUMNS,
        }
    }

    /// Ordered column names, as the classifier expects them.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        self.columns().iter().map(|c| c.name)
    }

    /// Ordered names of the columns the scaler was fitted on.
    pub fn scaled_names(self) -> impl Iterator<Item = &'static str> {
        self.columns().iter().filter(|c| c.scaled).map(|c| c.name)
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.columns().len()
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.columns().is_empty()
    }
}

impl std::fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Raw numeric record, ordered as its [`FeatureSet`] requires.
///
/// Immutable once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    set: FeatureSet,
    values: Vec<f64>,
}

impl FeatureRecord {
    /// Build the record for `set` from raw form values.
    #[must_use]
    pub fn assemble(input: &ClinicalInput, set: FeatureSet) -> Self {
        let values = set
            .columns()
            .iter()
            .map(|column| (column.extract)(input))
            .collect();

        Self { set, values }
    }

    #[must_use]
    pub fn set(&self) -> FeatureSet {
        self.set
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of a named column, if the set contains it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.set
            .columns()
            .iter()
            .position(|c| c.name == name)
            .map(|i| self.values[i])
    }

    /// Pairs of (column, value) in order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static FeatureColumn, f64)> + '_ {
        self.set.columns().iter().zip(self.values.iter().copied())
    }

    /// Wrap values produced by a scaler. Length is checked by the caller.
    pub(crate) fn normalized(set: FeatureSet, values: Vec<f64>) -> NormalizedRecord {
        debug_assert_eq!(values.len(), set.len());
        NormalizedRecord {
            inner: Self { set, values },
        }
    }
}

/// A feature record after scaling; the only input classifiers accept.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    inner: FeatureRecord,
}

impl NormalizedRecord {
    #[must_use]
    pub fn set(&self) -> FeatureSet {
        self.inner.set
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.inner.values
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.inner.get(name)
    }
}
