//! Audio Fetch Core Library
//!
//! This library turns a video link into a downloadable MP3: it validates the
//! link, drives an external extraction tool through an escalating sequence of
//! request personas, and streams the resulting transient file with byte-range
//! support before deleting it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Inbound video URL validation
//! - [`persona`] - Deterministic request persona rotation
//! - [`extract`] - Extraction tool boundary and yt-dlp client
//! - [`download`] - Persona escalation, artifact naming, pipeline orchestration
//! - [`title`] - Display title cleaning
//! - [`artifact`] - Artifact lifecycle and range-capable streaming
//! - [`store`] - File system seam
//! - [`server`] - axum routes and JSON errors

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod artifact;
pub mod download;
pub mod extract;
pub mod parser;
pub mod persona;
pub mod server;
pub mod store;
pub mod title;

// Re-export commonly used types
pub use artifact::{
    Artifact, ArtifactState, ArtifactStreamer, DEFAULT_ARTIFACT_MAX_LIFETIME,
    DEFAULT_CLEANUP_GRACE, StreamError,
};
pub use download::{
    AudioService, DEFAULT_MAX_ATTEMPTS, EscalationAttempt, EscalationReport, Escalator,
    ExhaustedError, PreparedAudio, ServiceError,
};
pub use extract::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_EXTRACTOR_PROGRAM, ExtractionClient, ExtractionError,
    VideoMetadata, YtDlpClient,
};
pub use parser::{ParseError, ValidatedUrl, validate_video_url};
pub use persona::{Persona, PersonaGenerator};
pub use server::{AppState, router};
pub use store::{FileStore, LocalFileStore, MemoryFileStore};
pub use title::clean_title;
