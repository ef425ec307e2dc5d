//! Request handlers.

use std::path::Path;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use arttag_core::AnalysisResult;

use super::error::{ApiError, ApiResult};
use super::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// `POST /analyze`: tag one uploaded image.
///
/// The response body is the bare category map, e.g.
/// `{"medium": [{"label": "oil painting", "confidence": 0.31}], ...}`.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AnalysisResult>> {
    // Refuse before buffering the upload.
    if !state.tagger.is_ready() {
        return Err(ApiError::Pipeline(arttag_core::PipelineError::Unavailable));
    }
    let mut multipart = multipart.map_err(|r| ApiError::BadRequest(r.body_text()))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or(IMAGE_FIELD).to_string();
        let bytes = field.bytes().await?;
        tracing::debug!("Received {} ({} bytes)", name, bytes.len());

        let result = state
            .tagger
            .analyze_bytes(bytes.to_vec(), Path::new(&name))
            .await?;
        return Ok(Json(result));
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{IMAGE_FIELD}'"
    )))
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Categories that were embedded at startup, in taxonomy order.
    pub categories: Vec<String>,
}

/// `GET /health`: liveness plus the categories available for scoring.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.tagger.is_ready() { "ok" } else { "unavailable" },
        service: "arttag",
        version: arttag_core::VERSION,
        categories: state
            .tagger
            .store()
            .category_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}
