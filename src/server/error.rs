//! JSON API errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::artifact::StreamError;
use crate::download::ServiceError;

/// Message for any metadata failure that is not the caller's fault.
pub const VIDEO_INFO_FAILED: &str = "Failed to get video information";

/// Message for any download failure that is not the caller's fault.
pub const DOWNLOAD_FAILED: &str = "Download failed. Please try again.";

/// Message for a missing URL or unreadable request body.
pub const URL_REQUIRED: &str = "URL is required";

/// Error response rendered as `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    const fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    /// 400 with `message`.
    #[must_use]
    pub const fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 500 with `message`.
    #[must_use]
    pub const fn internal(message: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Maps a pipeline error, using `generic` for every server-side fault.
    ///
    /// The full cause is logged here and never sent to the client.
    #[must_use]
    pub fn from_service(err: &ServiceError, generic: &'static str) -> Self {
        match err {
            ServiceError::InvalidInput(parse) => {
                warn!(error = %parse, "rejected request");
                Self::bad_request(parse.user_message())
            }
            ServiceError::Exhausted(exhausted) => {
                let trace: Vec<String> = exhausted
                    .attempts
                    .iter()
                    .map(|a| format!("#{} {}", a.persona_index, a.outcome))
                    .collect();
                error!(error = %exhausted, attempts = ?trace, "extraction exhausted");
                Self::internal(generic)
            }
            other => {
                error!(error = %other, "pipeline failed");
                Self::internal(generic)
            }
        }
    }

    /// Maps a streaming setup failure.
    #[must_use]
    pub fn from_stream(err: &StreamError) -> Self {
        error!(error = %err, "failed to start artifact stream");
        Self::internal(DOWNLOAD_FAILED)
    }

    /// HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
