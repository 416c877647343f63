//! Artifact store: loads the exported scalers and forests by fixed name.
//!
//! # Integrity
//!
//! An artifact directory may carry a `manifest.json` binding every artifact
//! name to its SHA-256 digest (written by the `write_manifest` binary).
//! When present, each artifact is hashed on read and a mismatch fails the
//! load. Deployments can make the manifest mandatory with
//! `GLYCOSENSE_REQUIRE_MANIFEST=true`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::forest::{BinaryForest, RandomForest, StageForest};
use super::scaler::StandardScaler;

/// Scaler for the diabetes detection model.
pub const PRIMARY_SCALER: &str = "scaler_task1.json";
/// Diabetes detection model.
pub const PRIMARY_MODEL: &str = "rf_diabetes_task1.json";
/// Scaler for the diabetes type model.
pub const SECONDARY_SCALER: &str = "scaler_task2.json";
/// Diabetes type model.
pub const SECONDARY_MODEL: &str = "rf_diabetes_task2.json";

/// Every artifact the application loads at startup.
pub const ARTIFACT_FILES: [&str; 4] = [
    PRIMARY_SCALER,
    PRIMARY_MODEL,
    SECONDARY_SCALER,
    SECONDARY_MODEL,
];

/// Name of the integrity manifest inside the artifact directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// Error type for artifact loading. Any of these aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    #[error("Artifact {name} not found at {path:?}")]
    Missing { name: String, path: PathBuf },

    #[error("Failed to read artifact {name}: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact {name} is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("Artifact {name} does not match its manifest digest")]
    IntegrityMismatch { name: String },

    #[error("Invalid manifest: {0}")]
    Manifest(String),
}

impl ArtifactError {
    fn corrupt(name: &str, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Integrity manifest binding artifact names to SHA-256 digests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was written.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Artifact file name -> lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Hash every known artifact in `dir`.
    ///
    /// # Errors
    /// Returns error if any artifact is missing or unreadable.
    pub fn build(dir: &Path, created_at: Option<i64>) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in ARTIFACT_FILES {
            let bytes = read_artifact_file(dir, name)?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            created_at,
            files,
        })
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.version != MANIFEST_VERSION {
            return Err(ArtifactError::Manifest(format!(
                "unsupported manifest version: {}",
                self.version
            )));
        }
        for name in ARTIFACT_FILES {
            if !self.files.contains_key(name) {
                return Err(ArtifactError::Manifest(format!(
                    "manifest does not list {name}"
                )));
            }
        }
        Ok(())
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn read_artifact_file(dir: &Path, name: &str) -> Result<Vec<u8>, ArtifactError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(ArtifactError::Missing {
            name: name.to_string(),
            path,
        });
    }
    fs::read(&path).map_err(|source| ArtifactError::Unreadable {
        name: name.to_string(),
        source,
    })
}

/// Read-only view of an artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    manifest: Option<ArtifactManifest>,
}

impl ArtifactStore {
    /// Open an artifact directory, reading its manifest if present.
    ///
    /// # Errors
    /// Returns error if the directory does not exist, the manifest is
    /// malformed, or `require_manifest` is set and no manifest exists.
    pub fn open(dir: &Path, require_manifest: bool) -> Result<Self, ArtifactError> {
        if !dir.is_dir() {
            return Err(ArtifactError::DirectoryNotFound(dir.to_path_buf()));
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = if manifest_path.is_file() {
            let bytes = fs::read(&manifest_path).map_err(|source| ArtifactError::Unreadable {
                name: MANIFEST_FILE.to_string(),
                source,
            })?;
            let manifest: ArtifactManifest = serde_json::from_slice(&bytes)
                .map_err(|e| ArtifactError::Manifest(format!("invalid format: {e}")))?;
            manifest.validate()?;
            tracing::info!(
                "Artifact manifest found ({} files bound)",
                manifest.files.len()
            );
            Some(manifest)
        } else if require_manifest {
            return Err(ArtifactError::Manifest(format!(
                "{MANIFEST_FILE} required but not found in {dir:?}"
            )));
        } else {
            tracing::warn!(
                "No {MANIFEST_FILE} in {:?}; artifacts are loaded without integrity check",
                dir
            );
            None
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether artifacts are checked against a manifest.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.manifest.is_some()
    }

    /// Read raw artifact bytes, verifying the manifest digest if any.
    ///
    /// # Errors
    /// Returns error if the file is missing, unreadable, or its digest
    /// differs from the manifest.
    pub fn read(&self, name: &str) -> Result<Vec<u8>, ArtifactError> {
        let bytes = read_artifact_file(&self.dir, name)?;

        if let Some(manifest) = &self.manifest {
            let expected = manifest.files.get(name).ok_or_else(|| {
                ArtifactError::Manifest(format!("manifest does not list {name}"))
            })?;
            if !sha256_hex(&bytes).eq_ignore_ascii_case(expected.trim()) {
                return Err(ArtifactError::IntegrityMismatch {
                    name: name.to_string(),
                });
            }
        }

        Ok(bytes)
    }

    /// Read and decode a JSON artifact.
    ///
    /// # Errors
    /// Returns `ArtifactError::Corrupt` if the JSON does not decode.
    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArtifactError> {
        let bytes = self.read(name)?;
        serde_json::from_slice(&bytes).map_err(|e| ArtifactError::corrupt(name, e.to_string()))
    }

    /// Load and validate a scaler.
    ///
    /// # Errors
    /// Returns error if the artifact cannot be read or is structurally invalid.
    pub fn load_scaler(&self, name: &str) -> Result<StandardScaler, ArtifactError> {
        let scaler: StandardScaler = self.load_json(name)?;
        scaler
            .validate()
            .map_err(|reason| ArtifactError::corrupt(name, reason))?;

        tracing::info!(
            "Loaded scaler {} (n_features={})",
            name,
            scaler.feature_names.len()
        );
        Ok(scaler)
    }

    /// Load the diabetes detection model.
    ///
    /// # Errors
    /// Returns error if the forest is structurally invalid or its classes
    /// are not `[0, 1]`.
    pub fn load_binary_forest(&self, name: &str) -> Result<BinaryForest, ArtifactError> {
        let forest: RandomForest = self.load_json(name)?;
        let classifier =
            BinaryForest::try_from(forest).map_err(|reason| ArtifactError::corrupt(name, reason))?;
        log_forest(name, classifier.forest());
        Ok(classifier)
    }

    /// Load the diabetes type model.
    ///
    /// # Errors
    /// Returns error if the forest is structurally invalid.
    pub fn load_stage_forest(&self, name: &str) -> Result<StageForest, ArtifactError> {
        let forest: RandomForest = self.load_json(name)?;
        let classifier =
            StageForest::try_from(forest).map_err(|reason| ArtifactError::corrupt(name, reason))?;
        log_forest(name, classifier.forest());
        Ok(classifier)
    }
}

fn log_forest(name: &str, forest: &RandomForest) {
    tracing::info!(
        "Loaded forest {} (n_trees={}, n_features={}, classes={:?})",
        name,
        forest.trees.len(),
        forest.feature_names.len(),
        forest.classes
    );
}
