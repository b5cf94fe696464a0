//! The upload relay: one multipart image in, one provider call, raw reply out.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::error::RelayError;
use crate::page;
use crate::provider::{ProviderClient, Upload};

/// Multipart field that carries the exam image.
pub const IMAGE_FIELD: &str = "image";
pub const UPLOAD_PATH: &str = "/api/upload";

pub struct AppState {
    pub provider: ProviderClient,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            provider: ProviderClient::new(config),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// JSON body of every relay response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadEnvelope {
    pub fn success(result: Option<String>) -> Self {
        Self {
            success: true,
            result,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            message: Some(message.into()),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(page::index))
        .route(UPLOAD_PATH, post(upload_exam))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// POST /api/upload
///
/// The provider's text is returned without any validation; parsing it is the
/// caller's job.
pub async fn upload_exam(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadEnvelope>, RelayError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Upload is not a multipart form");
        RelayError::MissingImage
    })?;

    let upload = read_image_field(&mut multipart)
        .await?
        .ok_or(RelayError::MissingImage)?;

    tracing::info!(
        file_name = upload.file_name.as_deref().unwrap_or("-"),
        bytes = upload.bytes.len(),
        "Received exam image"
    );

    let result = state.provider.read_scores(&upload).await?;

    tracing::info!(
        reply_chars = result.as_deref().map_or(0, |r| r.chars().count()),
        "Provider replied"
    );

    Ok(Json(UploadEnvelope::success(result)))
}

/// Returns the first `image` field, or `None` when it is absent or empty.
async fn read_image_field(multipart: &mut Multipart) -> Result<Option<Upload>, RelayError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;

        if bytes.is_empty() {
            return Ok(None);
        }

        return Ok(Some(Upload {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        }));
    }

    Ok(None)
}
