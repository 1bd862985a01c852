//! HTTP surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /api/video-info` | metadata as JSON |
//! | `POST /api/download` | MP3 artifact, range capable |
//! | `GET /health` | liveness |
//!
//! Errors are rendered as `{"error": "<message>"}` by [`ApiError`].

mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::artifact::ArtifactStreamer;
use crate::download::AudioService;

pub use error::{ApiError, DOWNLOAD_FAILED, URL_REQUIRED, VIDEO_INFO_FAILED};
pub use handlers::{UrlRequest, VideoInfoResponse};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    service: Arc<AudioService>,
    streamer: ArtifactStreamer,
}

impl AppState {
    /// Bundles the pipeline and the streamer.
    #[must_use]
    pub fn new(service: Arc<AudioService>, streamer: ArtifactStreamer) -> Self {
        Self { service, streamer }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/video-info", post(handlers::video_info))
        .route("/api/download", post(handlers::download))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
