//! Audio pipeline: persona escalation, artifact naming and orchestration.
//!
//! # Features
//!
//! - Sequential persona escalation with a full attempt trace
//! - Filesystem-safe, collision-free artifact paths
//! - Partial files removed whenever conversion does not yield audio
//! - Structured error types that separate caller faults from pipeline faults
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use audio_fetch_core::download::{AudioService, Escalator};
//! use audio_fetch_core::extract::YtDlpClient;
//! use audio_fetch_core::store::LocalFileStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(LocalFileStore::new());
//! let client = YtDlpClient::new("yt-dlp", Duration::from_secs(120), "/tmp/scratch", store.clone());
//! let service = AudioService::new(Arc::new(client), store, Escalator::default(), "/tmp/downloads");
//!
//! let prepared = service.get_audio("https://youtu.be/dQw4w9WgXcQ").await?;
//! println!("{} -> {}", prepared.download_name, prepared.artifact.path().display());
//! # Ok(())
//! # }
//! ```

mod error;
mod filename;
mod retry;
mod service;

pub use error::ServiceError;
pub use filename::{
    AUDIO_EXTENSION, ArtifactLocation, MAX_STEM_CHARS, artifact_location, content_disposition,
    sanitize_file_stem,
};
pub use retry::{
    AttemptOutcome, DEFAULT_MAX_ATTEMPTS, EscalationAttempt, EscalationReport, Escalator,
    ExhaustedError, MAX_ATTEMPTS_LIMIT,
};
pub use service::{AudioService, PreparedAudio};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, ServiceError>` explicitly in function signatures.
