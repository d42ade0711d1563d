use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{FitMode, Rgb};
use crate::rendering::{Presentation, PresentationRenderer};
use crate::services::BackgroundManager;

/// Largest accepted background upload
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Body of `PUT /api/background/fit`
#[derive(Debug, Deserialize, ToSchema)]
pub struct FitRequest {
    /// `cover`, `contain` or `stretch`
    #[serde(default)]
    pub fit: Option<String>,
}

/// Result of applying a new background
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundResponse {
    pub average_luminance: f64,
    pub average_color: Rgb,
    pub is_dark: bool,
    pub presentation: Presentation,
}

/// Current background presentation
#[utoipa::path(
    get,
    path = "/api/background",
    responses(
        (status = 200, description = "Current presentation", body = Presentation),
        (status = 500, description = "Background state could not be read"),
    ),
    tag = "Background"
)]
pub async fn handle_get_background(
    State(manager): State<Arc<BackgroundManager>>,
    State(renderer): State<Arc<PresentationRenderer>>,
) -> Result<Json<Presentation>, ApiError> {
    current_presentation(&manager, &renderer).await.map(Json)
}

/// The rendered presentation, with the stored fit preference filled in when
/// no image is set (fit changes without an image do not re-render)
async fn current_presentation(
    manager: &BackgroundManager,
    renderer: &PresentationRenderer,
) -> Result<Presentation, ApiError> {
    let mut presentation = renderer.current().await;
    if presentation.image_url.is_none() {
        presentation.fit = manager.fit_mode().await?;
    }
    Ok(presentation)
}

/// Replace the background image
///
/// The raw request body is the image (PNG, JPEG, GIF, WebP, BMP, ...).
#[utoipa::path(
    put,
    path = "/api/background",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Background applied", body = BackgroundResponse),
        (status = 400, description = "Empty body"),
        (status = 422, description = "Image could not be decoded"),
        (status = 500, description = "Background could not be stored"),
    ),
    tag = "Background"
)]
pub async fn handle_set_background(
    State(manager): State<Arc<BackgroundManager>>,
    State(renderer): State<Arc<PresentationRenderer>>,
    body: Bytes,
) -> Result<Json<BackgroundResponse>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("image body is empty".to_string()));
    }

    let stats = manager.set_background(body.to_vec()).await?;

    Ok(Json(BackgroundResponse {
        average_luminance: stats.average_luminance,
        average_color: stats.average_color,
        is_dark: stats.is_dark(),
        presentation: renderer.current().await,
    }))
}

/// Remove the background image and its metadata
#[utoipa::path(
    delete,
    path = "/api/background",
    responses(
        (status = 200, description = "Background removed", body = Presentation),
        (status = 500, description = "Background could not be removed"),
    ),
    tag = "Background"
)]
pub async fn handle_reset_background(
    State(manager): State<Arc<BackgroundManager>>,
    State(renderer): State<Arc<PresentationRenderer>>,
) -> Result<Json<Presentation>, ApiError> {
    manager.reset_background().await?;
    current_presentation(&manager, &renderer).await.map(Json)
}

/// Change how the background is sized
#[utoipa::path(
    put,
    path = "/api/background/fit",
    request_body = FitRequest,
    responses(
        (status = 200, description = "Fit mode stored", body = Presentation),
        (status = 400, description = "Missing or unknown fit mode"),
    ),
    tag = "Background"
)]
pub async fn handle_set_fit(
    State(manager): State<Arc<BackgroundManager>>,
    State(renderer): State<Arc<PresentationRenderer>>,
    Json(request): Json<FitRequest>,
) -> Result<Json<Presentation>, ApiError> {
    let fit = request.fit.ok_or(ApiError::MissingParameter("fit"))?;
    let mode = FitMode::parse(&fit)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown fit mode: {fit}")))?;

    manager.set_fit_mode(mode).await?;
    current_presentation(&manager, &renderer).await.map(Json)
}

/// Image bytes behind a live handle
#[utoipa::path(
    get,
    path = "/api/background/image/{handle}",
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Unknown or revoked handle"),
    ),
    params(
        ("handle" = String, Path, description = "Handle from the presentation's imageUrl"),
    ),
    tag = "Background"
)]
pub async fn handle_background_image(
    State(renderer): State<Arc<PresentationRenderer>>,
    Path(handle): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = renderer.image(&handle).await.ok_or(ApiError::NotFound)?;

    let content_type = image::guess_format(&bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
            // Handles are content-addressed
            (
                header::CACHE_CONTROL,
                "private, max-age=31536000, immutable".to_string(),
            ),
        ],
        Bytes::copy_from_slice(&bytes),
    )
        .into_response())
}
