use crate::AppState;
use crate::api::ApiError;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use std::io::ErrorKind;
use tokio_util::io::ReaderStream;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateVideoRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl GenerateVideoRequest {
    /// Reads the request from a JSON body; anything but an object carrying a string prompt
    /// reads as an empty request
    pub fn from_json(value: Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value)
            .inspect_err(|error| debug!(%error, "Malformed generate-video request"))
            .unwrap_or_default()
    }

    /// The prompt, if it has any non-whitespace content
    pub fn prompt(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
    }
}

/// `POST /generate-video`
///
/// Answers every valid prompt with the same pre-provisioned video, sent as an attachment.
pub async fn generate_video(
    Extension(state): Extension<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = match payload {
        Ok(Json(value)) => GenerateVideoRequest::from_json(value),
        Err(rejection) => {
            debug!(%rejection, "Unreadable request body");
            GenerateVideoRequest::default()
        }
    };

    let Some(prompt) = request.prompt() else {
        return Err(ApiError::MissingPrompt);
    };

    let path = state.sample_video();
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Sample video missing");
            return Err(ApiError::VideoNotFound);
        }
        Err(error) => return Err(state.internal_error(error)),
    };

    let metadata = file
        .metadata()
        .await
        .map_err(|error| state.internal_error(error))?;
    if !metadata.is_file() {
        return Err(state.internal_error(format!("{} is not a regular file", path.display())));
    }

    let size = metadata.len();
    debug!(%prompt, path = %path.display(), size, "Serving sample video");

    let headers = [
        (header::CONTENT_TYPE, state.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", state.download_name()),
        ),
        (header::CONTENT_LENGTH, size.to_string()),
    ];

    Ok((
        StatusCode::OK,
        headers,
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
