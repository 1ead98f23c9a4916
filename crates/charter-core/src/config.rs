//! Kernel configuration surface.
//!
//! Deserialized once at startup and handed to [`crate::kernel::Charter`]
//! by value. The database path is validated against an optional base
//! directory so a hostile configuration cannot point the store outside
//! the operator's data root.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::SafetyPolicy;

/// Which clock the kernel runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    /// The operating-system clock.
    #[default]
    Real,
    /// A frozen virtual clock, advanced explicitly by the caller.
    Virtual,
}

/// Errors raised while validating a configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The database path escapes the configured base directory.
    #[error("db_path {path} escapes base directory {base}")]
    PathOutsideBase {
        /// The offending path.
        path: String,
        /// The configured base directory.
        base: String,
    },

    /// The database path contains parent-directory components.
    #[error("db_path {path} contains parent-directory components")]
    PathTraversal {
        /// The offending path.
        path: String,
    },

    /// The log level is not one of trace/debug/info/warn/error.
    #[error("unknown log level {level}")]
    UnknownLogLevel {
        /// The rejected value.
        level: String,
    },
}

/// Top-level kernel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Path of the SQLite event store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Optional base directory the database path must stay within.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Clock selection.
    #[serde(default)]
    pub time_source: TimeSource,

    /// The full safety-policy numeric set.
    #[serde(default)]
    pub policy: SafetyPolicy,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("charter.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            base_dir: None,
            log_level: default_log_level(),
            time_source: TimeSource::default(),
            policy: SafetyPolicy::default(),
        }
    }
}

impl KernelConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the database path traverses out of
    /// the base directory or the log level is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .db_path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ConfigError::PathTraversal {
                path: self.db_path.display().to_string(),
            });
        }

        if let Some(base) = &self.base_dir {
            if !resolved(base, &self.db_path).starts_with(base) {
                return Err(ConfigError::PathOutsideBase {
                    path: self.db_path.display().to_string(),
                    base: base.display().to_string(),
                });
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::UnknownLogLevel {
                level: other.to_string(),
            }),
        }
    }

    /// The effective database path, rooted at the base directory when
    /// one is configured.
    #[must_use]
    pub fn resolved_db_path(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) => resolved(base, &self.db_path),
            None => self.db_path.clone(),
        }
    }
}

/// Joins `path` onto `base` unless `path` is already absolute.
fn resolved(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
