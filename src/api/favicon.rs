use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::models::{placeholder_glyph, IconTarget};
use crate::services::FaviconResolver;

/// Query parameters for the favicon endpoint
#[derive(Debug, Deserialize)]
pub struct FaviconQuery {
    /// Page URL the icon is for
    #[serde(default)]
    pub url: Option<String>,
    /// Title used for the placeholder glyph
    #[serde(default)]
    pub title: Option<String>,
}

/// Icon for a page, or what to show instead
#[derive(Debug, Serialize, ToSchema)]
pub struct FaviconResponse {
    /// Origin the icon is cached under
    pub origin: Option<String>,
    /// `data:` URL, null when no source had an icon
    pub icon: Option<String>,
    /// Glyph to show when `icon` is null
    pub placeholder: String,
}

/// Resolve the favicon for a page URL
///
/// The per-origin cache is consulted first; on a miss the configured sources
/// are tried in order. An absent or unusable URL yields `icon: null`.
#[utoipa::path(
    get,
    path = "/api/favicon",
    responses(
        (status = 200, description = "Icon lookup finished", body = FaviconResponse),
    ),
    params(
        ("url" = Option<String>, Query, description = "Page URL"),
        ("title" = Option<String>, Query, description = "Bookmark title for the placeholder"),
    ),
    tag = "Favicons"
)]
pub async fn handle_favicon(
    State(resolver): State<Arc<FaviconResolver>>,
    Query(query): Query<FaviconQuery>,
) -> Json<FaviconResponse> {
    let url = query.url.as_deref();
    let origin = url
        .and_then(IconTarget::from_page_url)
        .map(|target| target.origin);
    let icon = resolver.resolve(url).await;

    Json(FaviconResponse {
        origin,
        icon: icon.map(|i| i.into_string()),
        placeholder: placeholder_glyph(query.title.as_deref().unwrap_or("")),
    })
}
