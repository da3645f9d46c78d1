use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures of the generate-video endpoint, each bound to one status code
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    #[error("No prompt provided")]
    MissingPrompt,

    #[error("Sample video not found")]
    VideoNotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal_redacted() -> Self {
        ApiError::Internal("Internal server error".to_string())
    }

    pub fn to_err_code(&self) -> StatusCode {
        match self {
            ApiError::MissingPrompt => StatusCode::BAD_REQUEST,
            ApiError::VideoNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.to_err_code(), Json(body)).into_response()
    }
}
