//! Error types for annotation store operations.

use std::path::PathBuf;
use thiserror::Error;

/// The store file exists but does not hold a valid annotation mapping.
///
/// Loading recovers from this by starting with an empty mapping; the error is
/// handed back so the caller can warn the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Annotation store {path:?} is corrupt: {reason}")]
pub struct CorruptStoreError {
    /// Path of the unreadable file
    pub path: PathBuf,
    /// What was wrong with it
    pub reason: String,
}

/// Errors that can occur while reading or writing the annotation store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error on the store file
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Mapping could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Store file is unreadable
    #[error(transparent)]
    Corrupt(#[from] CorruptStoreError),
}

impl StoreError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
