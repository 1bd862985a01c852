//! Error types for video URL validation.

use thiserror::Error;

/// Maximum URL length to accept (standard browser limit).
/// URLs longer than this are rejected before any pattern matching.
pub const MAX_URL_LENGTH: usize = 2000;

/// Errors that can occur while validating an inbound video URL.
///
/// These are user-caused and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No URL was supplied, or only whitespace.
    #[error("URL is required")]
    Missing,

    /// URL does not match any accepted video reference pattern.
    #[error("unsupported video URL '{url}'\n  Suggestion: {suggestion}")]
    UnsupportedSource {
        /// The rejected input
        url: String,
        /// How to fix the issue
        suggestion: &'static str,
    },

    /// URL matched a known pattern but could not be parsed.
    #[error("malformed video URL '{url}': {reason}")]
    Malformed {
        /// The rejected input
        url: String,
        /// Why parsing failed
        reason: String,
    },

    /// URL exceeds maximum allowed length
    #[error("URL too long ({length} chars, max {max}): {url_preview}...")]
    UrlTooLong {
        /// Truncated URL for display
        url_preview: String,
        /// Actual length
        length: usize,
        /// Maximum allowed
        max: usize,
    },
}

impl ParseError {
    /// Creates an `UnsupportedSource` error.
    #[must_use]
    pub fn unsupported(url: &str) -> Self {
        Self::UnsupportedSource {
            url: url.to_string(),
            suggestion: "Use a youtube.com/watch?v=, youtu.be/, youtube.com/embed/ or youtube.com/v/ link",
        }
    }

    /// Creates a `Malformed` error.
    #[must_use]
    pub fn malformed(url: &str, reason: &str) -> Self {
        Self::Malformed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `UrlTooLong` error for URLs exceeding the maximum length.
    #[must_use]
    pub fn too_long(url: &str) -> Self {
        Self::UrlTooLong {
            url_preview: url.chars().take(50).collect(),
            length: url.len(),
            max: MAX_URL_LENGTH,
        }
    }

    /// Short message suitable for a JSON error body.
    ///
    /// Never echoes the rejected input back to the caller.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Missing => "URL is required",
            Self::UnsupportedSource { .. } | Self::Malformed { .. } | Self::UrlTooLong { .. } => {
                "Invalid YouTube URL"
            }
        }
    }
}
