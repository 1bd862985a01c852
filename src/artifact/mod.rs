//! Transient audio artifacts and their delivery.
//!
//! An [`Artifact`] is the MP3 file produced for one request. It moves through
//! `Creating -> Ready -> Streaming -> Deleted`:
//!
//! - `Creating` while the extraction tool writes it
//! - `Ready` once existence and a nonzero size have been confirmed
//! - `Streaming` after [`ArtifactStreamer`] has taken ownership
//! - `Deleted` once the cleanup task has removed it
//!
//! The streamer owns deletion from the moment it receives the artifact.

mod range;
mod streamer;

use std::fmt;
use std::path::{Path, PathBuf};

pub use range::{ByteRange, RangeRequest, parse_range_header};
pub use streamer::{
    ArtifactStreamer, DEFAULT_ARTIFACT_MAX_LIFETIME, DEFAULT_CLEANUP_GRACE, StreamError,
};

/// Lifecycle state of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    /// The tool is still producing the file.
    Creating,
    /// Confirmed on disk and not yet handed to a response.
    Ready,
    /// Owned by a response body.
    Streaming,
    /// Removed from disk.
    Deleted,
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Creating => "creating",
            Self::Ready => "ready",
            Self::Streaming => "streaming",
            Self::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// An audio file on disk belonging to exactly one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    byte_size: u64,
    state: ArtifactState,
}

impl Artifact {
    /// Starts tracking an artifact that is about to be written at `path`.
    #[must_use]
    pub fn creating(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            byte_size: 0,
            state: ArtifactState::Creating,
        }
    }

    /// Marks the artifact confirmed with its final size.
    #[must_use]
    pub fn into_ready(self, byte_size: u64) -> Self {
        Self {
            byte_size,
            state: ArtifactState::Ready,
            ..self
        }
    }

    pub(crate) fn into_streaming(self) -> Self {
        Self {
            state: ArtifactState::Streaming,
            ..self
        }
    }

    /// Artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Confirmed size in bytes (0 until ready).
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ArtifactState {
        self.state
    }
}
