//! Route handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::http::header::RANGE;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::AppState;
use super::error::{ApiError, DOWNLOAD_FAILED, URL_REQUIRED, VIDEO_INFO_FAILED};
use crate::extract::VideoMetadata;

/// Body of both `POST` routes.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    url: Option<String>,
}

/// `POST /api/video-info` success body.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VideoInfoResponse {
    title: String,
    duration: Option<u64>,
    thumbnail: String,
    author: String,
}

impl From<VideoMetadata> for VideoInfoResponse {
    fn from(meta: VideoMetadata) -> Self {
        Self {
            title: meta.cleaned_title().to_string(),
            duration: meta.duration_seconds(),
            thumbnail: meta.thumbnail_url().to_string(),
            author: meta.author().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

/// Pulls the URL out of a JSON body; unreadable bodies count as missing.
fn request_url(body: Result<Json<UrlRequest>, JsonRejection>) -> Result<String, ApiError> {
    match body {
        Ok(Json(UrlRequest { url: Some(url) })) => Ok(url),
        Ok(_) => Err(ApiError::bad_request(URL_REQUIRED)),
        Err(rejection) => {
            debug!(error = %rejection, "unreadable request body");
            Err(ApiError::bad_request(URL_REQUIRED))
        }
    }
}

pub(crate) async fn video_info(
    State(state): State<AppState>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<VideoInfoResponse>, ApiError> {
    let url = request_url(body)?;
    let metadata = state
        .service
        .get_metadata(&url)
        .await
        .map_err(|e| ApiError::from_service(&e, VIDEO_INFO_FAILED))?;

    info!(
        title = metadata.cleaned_title(),
        author = metadata.author(),
        duration = ?metadata.duration_seconds(),
        "video info"
    );
    Ok(Json(metadata.into()))
}

pub(crate) async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let url = request_url(body)?;
    let prepared = state
        .service
        .get_audio(&url)
        .await
        .map_err(|e| ApiError::from_service(&e, DOWNLOAD_FAILED))?;

    state
        .streamer
        .stream(
            prepared.artifact,
            &prepared.download_name,
            headers.get(RANGE),
        )
        .await
        .map_err(|e| ApiError::from_stream(&e))
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
