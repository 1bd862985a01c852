//! Extraction tool boundary.
//!
//! An [`ExtractionClient`] performs exactly one call against the external
//! extraction tool for one [`Persona`]: either dumping metadata or converting
//! the media to an MP3 file on disk. Clients never retry; escalation across
//! personas is the job of [`Escalator`](crate::download::Escalator).
//!
//! - [`YtDlpClient`] - production client driving a yt-dlp compatible binary
//! - [`VideoMetadata`] - metadata parsed from the tool's JSON dump
//! - [`ExtractionError`] - single-invocation failure

mod error;
mod ytdlp;

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::parser::ValidatedUrl;
use crate::persona::Persona;
use crate::title::clean_title;

pub use error::{ExtractionError, FailureKind};
pub use ytdlp::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_EXTRACTOR_PROGRAM, YtDlpClient};

/// Request/response boundary to the extraction tool.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Fetches metadata for `url` using `persona`.
    async fn fetch_metadata(
        &self,
        url: &ValidatedUrl,
        persona: &Persona,
    ) -> Result<VideoMetadata, ExtractionError>;

    /// Converts `url` to an MP3 written at `destination` using `persona`.
    async fn convert_to_audio(
        &self,
        url: &ValidatedUrl,
        persona: &Persona,
        destination: &Path,
    ) -> Result<(), ExtractionError>;
}

/// Metadata describing one upstream video.
///
/// `cleaned_title` is derived once at construction and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    title: String,
    cleaned_title: String,
    duration_seconds: Option<u64>,
    thumbnail_url: String,
    author: String,
}

/// Subset of the tool's JSON dump that we read.
#[derive(Debug, Deserialize)]
struct ToolInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
}

impl VideoMetadata {
    /// Builds metadata from raw upstream values.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        duration_seconds: Option<u64>,
        thumbnail_url: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let cleaned_title = clean_title(&title);
        Self {
            title,
            cleaned_title,
            duration_seconds,
            thumbnail_url: thumbnail_url.into(),
            author: author.into(),
        }
    }

    /// Parses the tool's single-JSON metadata dump.
    ///
    /// Author prefers `uploader` and falls back to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidOutput`] when stdout is not a JSON object.
    pub fn from_tool_json(stdout: &[u8]) -> Result<Self, ExtractionError> {
        let info: ToolInfo =
            serde_json::from_slice(stdout).map_err(ExtractionError::invalid_output)?;

        let duration_seconds = info
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u64);
        let author = info
            .uploader
            .filter(|s| !s.is_empty())
            .or(info.channel)
            .unwrap_or_default();

        Ok(Self::new(
            info.title.unwrap_or_default(),
            duration_seconds,
            info.thumbnail.unwrap_or_default(),
            author,
        ))
    }

    /// Raw upstream title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Title after [`clean_title`].
    #[must_use]
    pub fn cleaned_title(&self) -> &str {
        &self.cleaned_title
    }

    /// Duration in whole seconds, if known.
    #[must_use]
    pub fn duration_seconds(&self) -> Option<u64> {
        self.duration_seconds
    }

    /// Thumbnail URL (empty when unknown).
    #[must_use]
    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    /// Uploader or channel name (empty when unknown).
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }
}
