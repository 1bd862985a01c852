//! Shared utilities for integration tests.
//!
//! Provides a scripted [`ExtractionClient`] that fails a configurable number
//! of attempts before succeeding, and helpers to build the router over a real
//! temporary downloads directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use audio_fetch_core::extract::{ExtractionClient, ExtractionError, VideoMetadata};
use audio_fetch_core::persona::Persona;
use audio_fetch_core::{
    AppState, ArtifactStreamer, AudioService, Escalator, FileStore, LocalFileStore, ValidatedUrl,
    router,
};
use axum::Router;

/// Extraction client whose behavior is fixed up front.
pub struct ScriptedClient {
    title: String,
    metadata_failures: u32,
    convert_failures: u32,
    audio: Vec<u8>,
    metadata_personas: Mutex<Vec<u32>>,
    convert_destinations: Mutex<Vec<PathBuf>>,
}

impl ScriptedClient {
    /// Client that always succeeds with `audio` for `title`.
    pub fn new(title: &str, audio: Vec<u8>) -> Self {
        Self {
            title: title.to_string(),
            metadata_failures: 0,
            convert_failures: 0,
            audio,
            metadata_personas: Mutex::new(Vec::new()),
            convert_destinations: Mutex::new(Vec::new()),
        }
    }

    /// Fails the first `n` metadata attempts.
    pub fn failing_metadata(mut self, n: u32) -> Self {
        self.metadata_failures = n;
        self
    }

    /// Fails the first `n` conversion attempts.
    pub fn failing_conversion(mut self, n: u32) -> Self {
        self.convert_failures = n;
        self
    }

    pub fn metadata_personas(&self) -> Vec<u32> {
        self.metadata_personas.lock().expect("lock").clone()
    }

    pub fn convert_destinations(&self) -> Vec<PathBuf> {
        self.convert_destinations.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ExtractionClient for ScriptedClient {
    async fn fetch_metadata(
        &self,
        _url: &ValidatedUrl,
        persona: &Persona,
    ) -> Result<VideoMetadata, ExtractionError> {
        self.metadata_personas
            .lock()
            .expect("lock")
            .push(persona.index());
        if persona.index() < self.metadata_failures {
            return Err(ExtractionError::tool_failed(
                "exit status: 1",
                "ERROR: Sign in to confirm you're not a bot",
            ));
        }
        Ok(VideoMetadata::new(
            self.title.clone(),
            Some(215),
            "https://i.ytimg.com/vi/x/hqdefault.jpg",
            "Scripted Artist",
        ))
    }

    async fn convert_to_audio(
        &self,
        _url: &ValidatedUrl,
        persona: &Persona,
        destination: &Path,
    ) -> Result<(), ExtractionError> {
        self.convert_destinations
            .lock()
            .expect("lock")
            .push(destination.to_path_buf());

        let partial = destination.with_extension("webm.part");
        tokio::fs::write(&partial, b"partial")
            .await
            .expect("write partial");
        if persona.index() < self.convert_failures {
            return Err(ExtractionError::tool_failed("exit status: 1", "HTTP Error 403"));
        }
        tokio::fs::remove_file(&partial).await.expect("remove partial");
        tokio::fs::write(destination, &self.audio)
            .await
            .expect("write audio");
        Ok(())
    }
}

/// Builds the full router over `downloads_dir` with an immediate cleanup grace.
pub fn test_router(downloads_dir: &Path, client: Arc<ScriptedClient>, max_attempts: u32) -> Router {
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new());
    let service = AudioService::new(
        client,
        Arc::clone(&store),
        Escalator::new(max_attempts),
        downloads_dir,
    );
    let streamer = ArtifactStreamer::new(store, Duration::ZERO, Duration::from_secs(60));
    router(AppState::new(Arc::new(service), streamer))
}

/// Lists file names currently in `dir`.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Waits up to two seconds for `dir` to become empty.
pub async fn wait_for_empty_dir(dir: &Path) -> bool {
    for _ in 0..200 {
        if dir_entries(dir).is_empty() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Deterministic test payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
