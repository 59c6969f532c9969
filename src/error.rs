//! Error types for StrataKV
//!
//! Provides a unified error type for all operations. "Not found" is never
//! an error: lookups return `Option` and only the engine's top-level `get`
//! collapses tombstone-or-absent into one visible "not found". Misuse of a
//! run's row index is an invariant violation and panics instead of erroring.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Unified error type for StrataKV operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Run Errors
    // -------------------------------------------------------------------------
    #[error("malformed run {}: {reason}", .path.display())]
    MalformedRun { path: PathBuf, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl StrataError {
    /// Attach the failing path to a low-level I/O error.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// A run file whose footer or index region does not add up.
    pub fn malformed(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::MalformedRun {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }
}
