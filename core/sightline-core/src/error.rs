//! Error types for sightline-core operations.
//!
//! Only persistence and configuration I/O can fail. Query misses (a selected key
//! with no history record, marking an unknown key) are never errors.

use std::path::PathBuf;

/// All errors that can occur in sightline-core operations.
#[derive(Debug, thiserror::Error)]
pub enum SightlineError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Configuration write failed: {path}: {source}")]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("History file has no parent directory: {0}")]
    NoParentDir(PathBuf),

    #[error("History store is detached; no further saves accepted")]
    Detached,

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SightlineError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SightlineError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        SightlineError::Json {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using SightlineError.
pub type Result<T> = std::result::Result<T, SightlineError>;

impl From<SightlineError> for String {
    fn from(err: SightlineError) -> String {
        err.to_string()
    }
}
