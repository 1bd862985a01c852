//! Video URL validation against the accepted-source pattern set.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use ::url::Url;

use super::error::{MAX_URL_LENGTH, ParseError};

/// Accepted video reference shapes: optional scheme, optional `www.`, then one
/// of the known watch/short/embed/legacy path prefixes. Case-sensitive.
#[allow(clippy::expect_used)]
static VIDEO_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)",
    )
    .expect("video URL regex is valid") // Static pattern, safe to panic
});

/// A video URL that passed validation.
///
/// Always carries an explicit scheme; scheme-less input is normalized to `https://`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(String);

impl ValidatedUrl {
    /// Returns the normalized URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ValidatedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validates an inbound video URL.
///
/// No network access; purely syntactic.
///
/// # Errors
///
/// - [`ParseError::Missing`] for empty or whitespace-only input
/// - [`ParseError::UrlTooLong`] past [`MAX_URL_LENGTH`]
/// - [`ParseError::UnsupportedSource`] when no accepted pattern matches
/// - [`ParseError::Malformed`] when the matched input still fails URL parsing
///
/// # Examples
///
/// ```
/// use audio_fetch_core::parser::validate_video_url;
///
/// let url = validate_video_url("youtu.be/dQw4w9WgXcQ").unwrap();
/// assert_eq!(url.as_str(), "https://youtu.be/dQw4w9WgXcQ");
/// assert!(validate_video_url("https://example.com/video").is_err());
/// ```
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn validate_video_url(input: &str) -> Result<ValidatedUrl, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Missing);
    }

    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ParseError::too_long(trimmed));
    }

    if !VIDEO_URL_PATTERN.is_match(trimmed) {
        debug!(url = %trimmed, "rejected URL outside accepted pattern set");
        return Err(ParseError::unsupported(trimmed));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed =
        Url::parse(&candidate).map_err(|e| ParseError::malformed(trimmed, &e.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(ParseError::malformed(trimmed, "URL has no host"));
    }

    Ok(ValidatedUrl(candidate))
}
