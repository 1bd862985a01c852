//! Range-capable streaming of artifacts with guaranteed deletion.
//!
//! The response body owns a cleanup guard. Hyper drops the body when the
//! transfer finishes, fails or the client goes away; the guard then schedules
//! deletion after a short grace delay. A safety timer deletes the artifact
//! after a bounded lifetime even if the body is never dropped. Deletion runs
//! at most once.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use axum::http::StatusCode;
use axum::response::Response;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::range::{RangeRequest, parse_range_header};
use super::{Artifact, ArtifactState};
use crate::download::content_disposition;
use crate::store::{FileStore, RangeReader};

/// Delay between the body being dropped and the artifact being deleted.
pub const DEFAULT_CLEANUP_GRACE: Duration = Duration::from_secs(1);

/// Longest an artifact may live once handed to the streamer.
pub const DEFAULT_ARTIFACT_MAX_LIFETIME: Duration = Duration::from_secs(600);

const AUDIO_MPEG: &str = "audio/mpeg";

/// Errors raised before any response bytes are sent.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The artifact could not be opened for reading.
    #[error("failed to open artifact {path}: {source}")]
    Open {
        /// Artifact path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A response header could not be encoded.
    #[error("invalid response header: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl StreamError {
    /// Creates an open error.
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}

/// Turns ready artifacts into HTTP responses.
#[derive(Clone)]
pub struct ArtifactStreamer {
    store: Arc<dyn FileStore>,
    cleanup_grace: Duration,
    max_lifetime: Duration,
}

impl std::fmt::Debug for ArtifactStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStreamer")
            .field("cleanup_grace", &self.cleanup_grace)
            .field("max_lifetime", &self.max_lifetime)
            .finish_non_exhaustive()
    }
}

impl ArtifactStreamer {
    /// Creates a streamer reading and deleting through `store`.
    #[must_use]
    pub fn new(store: Arc<dyn FileStore>, cleanup_grace: Duration, max_lifetime: Duration) -> Self {
        Self {
            store,
            cleanup_grace,
            max_lifetime,
        }
    }

    /// Builds the response for `artifact`, honoring an optional `Range` header.
    ///
    /// Takes ownership of the artifact: it is deleted whatever happens next,
    /// including when this function returns an error.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if the artifact cannot be opened or a header
    /// cannot be encoded. Failures after headers are sent are only logged.
    #[instrument(
        skip(self, artifact, range),
        fields(path = %artifact.path().display(), size = artifact.byte_size())
    )]
    pub async fn stream(
        &self,
        artifact: Artifact,
        download_name: &str,
        range: Option<&HeaderValue>,
    ) -> Result<Response, StreamError> {
        let artifact = artifact.into_streaming();
        let cleanup = Arc::new(ArtifactCleanup::new(
            artifact.path(),
            Arc::clone(&self.store),
            self.cleanup_grace,
        ));
        spawn_safety_timer(&cleanup, self.max_lifetime);
        let guard = CleanupGuard(cleanup);

        let size = artifact.byte_size();
        let mut headers = HeaderMap::new();
        insert_common_headers(&mut headers);

        let (status, start, len) = match parse_range_header(range, size) {
            RangeRequest::Unsatisfiable => {
                debug!("range not satisfiable");
                drop(guard);
                headers.insert(
                    header::CONTENT_RANGE,
                    HeaderValue::from_str(&format!("bytes */{size}"))?,
                );
                return Ok(build_response(
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    headers,
                    Body::empty(),
                ));
            }
            RangeRequest::Full => (StatusCode::OK, 0, size),
            RangeRequest::Partial(range) => {
                headers.insert(
                    header::CONTENT_RANGE,
                    HeaderValue::from_str(&format!(
                        "bytes {}-{}/{size}",
                        range.start, range.end
                    ))?,
                );
                (StatusCode::PARTIAL_CONTENT, range.start, range.len())
            }
        };

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(AUDIO_MPEG));
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&content_disposition(download_name))?,
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

        let reader = self
            .store
            .open_range(artifact.path(), start, len)
            .await
            .map_err(|e| StreamError::open(artifact.path(), e))?;

        let path = artifact.path().to_path_buf();
        let stream = ReaderStream::new(GuardedReader {
            inner: reader,
            _guard: guard,
        })
        .map(move |chunk| {
            if let Err(e) = &chunk {
                warn!(path = %path.display(), error = %e, "artifact read failed mid-stream");
            }
            chunk
        });

        info!(status = status.as_u16(), start, len, "streaming artifact");
        Ok(build_response(status, headers, Body::from_stream(stream)))
    }
}

fn insert_common_headers(headers: &mut HeaderMap) {
    let fixed: [(HeaderName, &'static str); 4] = [
        (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        (header::PRAGMA, "no-cache"),
        (header::EXPIRES, "0"),
        (header::ACCEPT_RANGES, "bytes"),
    ];
    for (name, value) in fixed {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Deletes one artifact, at most once.
struct ArtifactCleanup {
    path: PathBuf,
    store: Arc<dyn FileStore>,
    grace: Duration,
    scheduled: AtomicBool,
    safety_timer: CancellationToken,
}

impl ArtifactCleanup {
    fn new(path: &Path, store: Arc<dyn FileStore>, grace: Duration) -> Self {
        Self {
            path: path.to_path_buf(),
            store,
            grace,
            scheduled: AtomicBool::new(false),
            safety_timer: CancellationToken::new(),
        }
    }

    fn schedule(self: &Arc<Self>, delay: Duration, reason: &'static str) {
        if self.scheduled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.safety_timer.cancel();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(path = %self.path.display(), "no runtime to delete artifact");
            return;
        };
        let this = Arc::clone(self);
        handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match this.store.remove(&this.path).await {
                Ok(true) => info!(
                    path = %this.path.display(),
                    reason,
                    state = %ArtifactState::Deleted,
                    "artifact deleted"
                ),
                Ok(false) => debug!(path = %this.path.display(), "artifact already gone"),
                Err(e) => warn!(path = %this.path.display(), error = %e, "failed to delete artifact"),
            }
        });
    }
}

/// Schedules deletion when dropped.
struct CleanupGuard(Arc<ArtifactCleanup>);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let grace = self.0.grace;
        self.0.schedule(grace, "response finished");
    }
}

/// Deletes the artifact after `max_lifetime` unless cleanup was scheduled first.
///
/// The task exits as soon as cleanup is scheduled.
fn spawn_safety_timer(
    cleanup: &Arc<ArtifactCleanup>,
    max_lifetime: Duration,
) -> Option<JoinHandle<()>> {
    let handle = tokio::runtime::Handle::try_current().ok()?;
    let cancelled = cleanup.safety_timer.clone();
    let cleanup: Weak<ArtifactCleanup> = Arc::downgrade(cleanup);
    Some(handle.spawn(async move {
        tokio::select! {
            () = cancelled.cancelled() => {}
            () = tokio::time::sleep(max_lifetime) => {
                if let Some(cleanup) = cleanup.upgrade() {
                    cleanup.schedule(Duration::ZERO, "max lifetime reached");
                }
            }
        }
    }))
}

/// Reader that keeps the cleanup guard alive for as long as the body.
struct GuardedReader {
    inner: RangeReader,
    _guard: CleanupGuard,
}

impl AsyncRead for GuardedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}
