//! HTTP error responses for the API.
//!
//! Wire shape is `{"detail": "..."}`. Internal failures (database, IO,
//! config) are logged and surfaced as an opaque 500; validation detail
//! names the offending field but never internal state.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::error::JournalError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }
}

impl From<JournalError> for ApiError {
    fn from(err: JournalError) -> Self {
        let status = match &err {
            JournalError::Validation { .. } => StatusCode::BAD_REQUEST,
            JournalError::InvalidCredentials | JournalError::Unauthorized { .. } => {
                StatusCode::UNAUTHORIZED
            }
            JournalError::NotFound => StatusCode::NOT_FOUND,
            JournalError::DuplicateEmail => StatusCode::CONFLICT,
            JournalError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            JournalError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            JournalError::Database { .. }
            | JournalError::DatabaseQuery { .. }
            | JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. }
            | JournalError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "internal error while handling request");
            return Self::new(status, "internal server error");
        }

        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
