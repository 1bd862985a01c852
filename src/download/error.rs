//! Error types for the audio pipeline.
//!
//! Only [`ServiceError::InvalidInput`] carries a message meant for the caller;
//! every other variant is logged in full and reported generically.

use std::path::PathBuf;

use thiserror::Error;

use super::retry::ExhaustedError;
use crate::parser::ParseError;

/// Errors from [`AudioService`](super::AudioService) operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The submitted URL was missing or rejected.
    #[error(transparent)]
    InvalidInput(#[from] ParseError),

    /// Every persona failed.
    #[error(transparent)]
    Exhausted(#[from] ExhaustedError),

    /// The tool reported success but no usable artifact exists.
    #[error("conversion produced no audio file at {path}")]
    ArtifactMissing {
        /// Expected artifact path.
        path: PathBuf,
    },

    /// Artifact storage could not be prepared or inspected.
    #[error("storage error at {path}: {source}")]
    Storage {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ServiceError {
    /// Creates an artifact-missing error.
    pub fn artifact_missing(path: impl Into<PathBuf>) -> Self {
        Self::ArtifactMissing { path: path.into() }
    }

    /// Creates a storage error.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
