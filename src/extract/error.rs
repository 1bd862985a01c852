//! Error types for extraction tool invocations.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Maximum number of stderr characters kept on a failed invocation.
const STDERR_TAIL_CHARS: usize = 1000;

/// Stderr fragments that indicate the video itself cannot be fetched,
/// no matter which persona asks.
const PERMANENT_MARKERS: [&str; 5] = [
    "Video unavailable",
    "Private video",
    "has been removed",
    "not available in your country",
    "Unsupported URL",
];

/// Coarse classification of an extraction failure.
///
/// Informational only: the escalator treats every failure as retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rate limiting, bot checks, network trouble, timeouts.
    Transient,
    /// The upstream reports the video as gone or private.
    Permanent,
}

/// Errors from a single extraction tool invocation.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The tool binary could not be started or awaited.
    #[error("failed to run extraction tool {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The invocation exceeded its per-attempt time budget and was killed.
    #[error("extraction tool timed out after {}s", .after.as_secs())]
    Timeout {
        /// Budget that was exceeded.
        after: Duration,
    },

    /// The tool exited unsuccessfully.
    #[error("extraction tool failed ({status}): {stderr}")]
    ToolFailed {
        /// Exit status description.
        status: String,
        /// Tail of the tool's stderr.
        stderr: String,
    },

    /// The tool succeeded but printed metadata that could not be parsed.
    #[error("extraction tool returned unreadable metadata: {source}")]
    InvalidOutput {
        /// JSON decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The persona's cookie file could not be written.
    #[error("failed to write cookie file {path}: {source}")]
    CookieFile {
        /// Scratch file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ExtractionError {
    /// Creates a spawn error.
    pub fn spawn(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout { after }
    }

    /// Creates a tool failure, keeping only the tail of stderr.
    pub fn tool_failed(status: impl Into<String>, stderr: &str) -> Self {
        Self::ToolFailed {
            status: status.into(),
            stderr: stderr_tail(stderr),
        }
    }

    /// Creates an invalid-output error.
    pub fn invalid_output(source: serde_json::Error) -> Self {
        Self::InvalidOutput { source }
    }

    /// Creates a cookie file error.
    pub fn cookie_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CookieFile {
            path: path.into(),
            source,
        }
    }

    /// Classifies the failure from the tool's diagnostics.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::ToolFailed { stderr, .. }
                if PERMANENT_MARKERS.iter().any(|m| stderr.contains(m)) =>
            {
                FailureKind::Permanent
            }
            _ => FailureKind::Transient,
        }
    }
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - STDERR_TAIL_CHARS).collect()
}
