//! Runtime configuration from environment variables.
//!
//! | Variable                      | Default          |
//! |-------------------------------|------------------|
//! | `GLYCOSENSE_ARTIFACT_DIR`     | `models`         |
//! | `GLYCOSENSE_REQUIRE_MANIFEST` | `false`          |
//! | `GLYCOSENSE_LOG_MODE`         | `auto`           |
//! | `GLYCOSENSE_LOG_FILE`         | `glycosense.log` |

use std::path::PathBuf;

pub const ARTIFACT_DIR_ENV: &str = "GLYCOSENSE_ARTIFACT_DIR";
pub const REQUIRE_MANIFEST_ENV: &str = "GLYCOSENSE_REQUIRE_MANIFEST";
pub const LOG_MODE_ENV: &str = "GLYCOSENSE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "GLYCOSENSE_LOG_FILE";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    /// Parse a mode name; unrecognized values fall back to `Auto`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Whether to log to a file, given whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Application settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub artifact_dir: PathBuf,
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("models"),
            require_manifest: false,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("glycosense.log"),
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (testable without
    /// touching the process environment).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            artifact_dir: lookup(ARTIFACT_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            require_manifest: lookup(REQUIRE_MANIFEST_ENV)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.require_manifest),
            log_mode: lookup(LOG_MODE_ENV)
                .map(|v| LogMode::parse(&v))
                .unwrap_or(defaults.log_mode),
            log_file: lookup(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}
