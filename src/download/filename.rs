//! Filesystem-safe names for audio artifacts and their download headers.
//!
//! Two names exist per artifact: the on-disk path, which carries a random
//! disambiguator so concurrent requests never share a file, and the
//! user-facing download name, which is only the cleaned title.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::title::UNTITLED;

/// Maximum characters kept in a filename stem.
pub const MAX_STEM_CHARS: usize = 120;

/// Extension of every produced artifact.
pub const AUDIO_EXTENSION: &str = "mp3";

const WINDOWS_RESERVED: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Makes a title safe to use as a filename stem on common filesystems.
///
/// Path separators, reserved punctuation and control characters become `_`,
/// leading dots are stripped, Windows device names are prefixed with `_` and
/// the result is truncated to [`MAX_STEM_CHARS`]. Never returns an empty stem.
#[must_use]
pub fn sanitize_file_stem(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim().trim_start_matches('.').trim();
    let mut stem: String = trimmed.chars().take(MAX_STEM_CHARS).collect();
    let trimmed_len = stem.trim_end().len();
    stem.truncate(trimmed_len);

    if stem.is_empty() {
        return UNTITLED.to_string();
    }

    let device = stem.split('.').next().unwrap_or_default();
    if WINDOWS_RESERVED
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(device))
    {
        stem.insert(0, '_');
    }
    stem
}

/// On-disk location of a fresh artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    /// Full path of the final `.mp3` file.
    pub path: PathBuf,
    /// File name without extension; every file the tool writes for this
    /// request starts with it.
    pub stem: String,
}

/// Builds a unique artifact path inside `dir` for `title`.
#[must_use]
pub fn artifact_location(dir: &Path, title: &str) -> ArtifactLocation {
    let stem = format!(
        "{}-{}",
        sanitize_file_stem(title),
        Uuid::new_v4().simple()
    );
    let path = dir.join(format!("{stem}.{AUDIO_EXTENSION}"));
    ArtifactLocation { path, stem }
}

/// Builds an RFC 6266 `Content-Disposition` value for `download_name`.
///
/// The quoted `filename` fallback is ASCII with quotes and backslashes
/// replaced; `filename*` carries the exact UTF-8 name percent-encoded.
#[must_use]
pub fn content_disposition(download_name: &str) -> String {
    let file_name = format!("{download_name}.{AUDIO_EXTENSION}");
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(&file_name)
    )
}
