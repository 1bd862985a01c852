//! Metadata and audio pipeline orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::error::ServiceError;
use super::filename::{ArtifactLocation, artifact_location};
use super::retry::Escalator;
use crate::artifact::Artifact;
use crate::extract::{ExtractionClient, VideoMetadata};
use crate::parser::{ValidatedUrl, validate_video_url};
use crate::store::FileStore;

/// A confirmed artifact together with the name offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedAudio {
    /// Ready artifact on disk.
    pub artifact: Artifact,
    /// Cleaned title used for `Content-Disposition` (without extension).
    pub download_name: String,
}

/// Runs validation, escalation and artifact confirmation for each request.
///
/// Holds no per-request state; one instance serves all requests concurrently.
pub struct AudioService {
    client: Arc<dyn ExtractionClient>,
    store: Arc<dyn FileStore>,
    escalator: Escalator,
    downloads_dir: PathBuf,
}

impl std::fmt::Debug for AudioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioService")
            .field("escalator", &self.escalator)
            .field("downloads_dir", &self.downloads_dir)
            .finish_non_exhaustive()
    }
}

impl AudioService {
    /// Creates a service writing artifacts into `downloads_dir`.
    #[must_use]
    pub fn new(
        client: Arc<dyn ExtractionClient>,
        store: Arc<dyn FileStore>,
        escalator: Escalator,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            store,
            escalator,
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Validates `raw_url` and fetches its metadata.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidInput`] when the URL is missing or rejected
    /// - [`ServiceError::Exhausted`] when every persona failed
    #[instrument(skip(self))]
    pub async fn get_metadata(&self, raw_url: &str) -> Result<VideoMetadata, ServiceError> {
        let url = validate_video_url(raw_url)?;
        self.fetch_metadata(&url).await
    }

    /// Validates `raw_url`, converts it to MP3 and confirms the artifact.
    ///
    /// On failure no file belonging to this request is left behind.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidInput`] when the URL is missing or rejected
    /// - [`ServiceError::Exhausted`] when metadata or conversion failed for every persona
    /// - [`ServiceError::ArtifactMissing`] when the tool succeeded without producing audio
    /// - [`ServiceError::Storage`] when the downloads directory is unusable
    #[instrument(skip(self))]
    pub async fn get_audio(&self, raw_url: &str) -> Result<PreparedAudio, ServiceError> {
        let url = validate_video_url(raw_url)?;
        let metadata = self.fetch_metadata(&url).await?;
        let download_name = metadata.cleaned_title().to_string();

        self.store
            .ensure_dir(&self.downloads_dir)
            .await
            .map_err(|e| ServiceError::storage(&self.downloads_dir, e))?;

        let location = artifact_location(&self.downloads_dir, &download_name);
        let pending = PendingFiles::new(
            &self.downloads_dir,
            &location.stem,
            Arc::clone(&self.store),
        );
        let artifact = Artifact::creating(&location.path);
        debug!(path = %location.path.display(), "converting to audio");

        let client = Arc::clone(&self.client);
        let destination = location.path.clone();
        let report = self
            .escalator
            .run(&url, move |url, persona| {
                let client = Arc::clone(&client);
                let destination = destination.clone();
                async move { client.convert_to_audio(&url, &persona, &destination).await }
            })
            .await;

        if let Err(e) = report.into_result() {
            pending.discard().await;
            return Err(e.into());
        }

        let artifact = match self.confirm(artifact, &location).await {
            Ok(artifact) => artifact,
            Err(e) => {
                pending.discard().await;
                return Err(e);
            }
        };
        pending.keep();

        info!(
            path = %artifact.path().display(),
            bytes = artifact.byte_size(),
            "audio ready"
        );
        Ok(PreparedAudio {
            artifact,
            download_name,
        })
    }

    async fn fetch_metadata(&self, url: &ValidatedUrl) -> Result<VideoMetadata, ServiceError> {
        let client = Arc::clone(&self.client);
        let report = self
            .escalator
            .run(url, move |url, persona| {
                let client = Arc::clone(&client);
                async move { client.fetch_metadata(&url, &persona).await }
            })
            .await;
        Ok(report.into_result()?)
    }

    /// Promotes the artifact to ready once it exists with a nonzero size.
    async fn confirm(
        &self,
        artifact: Artifact,
        location: &ArtifactLocation,
    ) -> Result<Artifact, ServiceError> {
        let size = if self.store.exists(&location.path).await {
            self.store
                .size(&location.path)
                .await
                .map_err(|e| ServiceError::storage(&location.path, e))?
        } else {
            0
        };

        if size == 0 {
            warn!(path = %location.path.display(), "tool reported success but no audio was produced");
            return Err(ServiceError::artifact_missing(&location.path));
        }
        Ok(artifact.into_ready(size))
    }
}

/// Files of one request, removed unless the artifact is handed on.
///
/// If the request future is dropped mid-conversion the removal is spawned
/// onto the runtime from `Drop`.
struct PendingFiles {
    dir: PathBuf,
    stem: String,
    store: Arc<dyn FileStore>,
    armed: bool,
}

impl PendingFiles {
    fn new(dir: &Path, stem: &str, store: Arc<dyn FileStore>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            stem: stem.to_string(),
            store,
            armed: true,
        }
    }

    /// Removes every file with this request's stem now.
    async fn discard(mut self) {
        self.armed = false;
        remove_stem_files(self.store.as_ref(), &self.dir, &self.stem).await;
    }

    /// Leaves the files in place; the caller now owns the artifact.
    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingFiles {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(stem = %self.stem, "no runtime to remove abandoned files");
            return;
        };
        debug!(stem = %self.stem, "request dropped before completion");
        let dir = std::mem::take(&mut self.dir);
        let stem = std::mem::take(&mut self.stem);
        let store = Arc::clone(&self.store);
        handle.spawn(async move {
            remove_stem_files(store.as_ref(), &dir, &stem).await;
        });
    }
}

async fn remove_stem_files(store: &dyn FileStore, dir: &Path, stem: &str) {
    match store.remove_prefixed(dir, stem).await {
        Ok(0) => {}
        Ok(removed) => debug!(removed, stem, "removed partial files"),
        Err(e) => warn!(stem, error = %e, "failed to remove partial files"),
    }
}
