use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{Bookmark, BookmarkChanges};
use crate::services::{BookmarkBrowser, FolderView};

/// The root folder of the grid
#[utoipa::path(
    get,
    path = "/api/folders/root",
    responses(
        (status = 200, description = "Root folder view", body = FolderView),
        (status = 404, description = "Root folder not present in the tree"),
    ),
    tag = "Bookmarks"
)]
pub async fn handle_root_folder(
    State(browser): State<Arc<BookmarkBrowser>>,
) -> Result<Json<FolderView>, ApiError> {
    Ok(Json(browser.root_view().await?))
}

/// A folder of the grid
#[utoipa::path(
    get,
    path = "/api/folders/{id}",
    responses(
        (status = 200, description = "Folder view", body = FolderView),
        (status = 400, description = "Id is not a folder"),
        (status = 404, description = "Unknown id"),
    ),
    params(
        ("id" = String, Path, description = "Folder id"),
    ),
    tag = "Bookmarks"
)]
pub async fn handle_folder(
    State(browser): State<Arc<BookmarkBrowser>>,
    Path(id): Path<String>,
) -> Result<Json<FolderView>, ApiError> {
    Ok(Json(browser.folder(&id).await?))
}

/// Edit a bookmark's title and/or URL
#[utoipa::path(
    patch,
    path = "/api/bookmarks/{id}",
    request_body = BookmarkChanges,
    responses(
        (status = 200, description = "Updated bookmark", body = Bookmark),
        (status = 400, description = "Nothing to change or invalid URL"),
        (status = 404, description = "Unknown id"),
    ),
    params(
        ("id" = String, Path, description = "Bookmark id"),
    ),
    tag = "Bookmarks"
)]
pub async fn handle_update_bookmark(
    State(browser): State<Arc<BookmarkBrowser>>,
    Path(id): Path<String>,
    Json(changes): Json<BookmarkChanges>,
) -> Result<Json<Bookmark>, ApiError> {
    if changes.title.is_none() && changes.url.is_none() {
        return Err(ApiError::BadRequest("nothing to update".to_string()));
    }
    Ok(Json(browser.store().update(&id, changes).await?))
}
