use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::relay::UploadEnvelope;

/// Failures of the upload relay, each mapped to one HTTP status.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no image field in the upload")]
    MissingImage,
    #[error("failed to read multipart upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("provider responded with status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("provider returned no choices")]
    NoChoices,
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider reply could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingImage => StatusCode::BAD_REQUEST,
            RelayError::NoChoices => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the caller. All processing failures share one message.
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::MissingImage => "No file uploaded",
            RelayError::NoChoices => "No results found",
            _ => "Failed to process image",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Error processing image");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Upload rejected");
        }

        (status, Json(UploadEnvelope::failure(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(RelayError::MissingImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::NoChoices.status(), StatusCode::NOT_FOUND);
        let upstream = RelayError::UpstreamStatus {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.public_message(), "Failed to process image");
    }
}
