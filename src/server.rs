//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::rendering::{PresentationRenderer, IMAGE_URL_PREFIX};
use crate::services::{
    BackgroundManager, BlobStore, BookmarkBrowser, BookmarkStore, FaviconResolver, Fetcher,
    FileBlobStore, HttpFetcher, InMemoryBookmarkStore, JsonFileKvStore, KeyValueStore,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub favicons: Arc<FaviconResolver>,
    pub background: Arc<BackgroundManager>,
    pub renderer: Arc<PresentationRenderer>,
    pub bookmarks: Arc<BookmarkBrowser>,
}

impl AppState {
    /// Wire the services over the given stores.
    ///
    /// Favicon cache entries and background metadata share `kv`.
    pub fn with_stores(
        config: AppConfig,
        kv: Arc<dyn KeyValueStore>,
        blobs: Arc<dyn BlobStore>,
        bookmarks: Arc<dyn BookmarkStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let renderer = Arc::new(PresentationRenderer::new(IMAGE_URL_PREFIX));
        let favicons = Arc::new(FaviconResolver::new(
            kv.clone(),
            fetcher,
            config.favicon.sources.clone(),
        ));
        let background = Arc::new(BackgroundManager::new(kv, blobs, renderer.clone()));
        let bookmarks = Arc::new(BookmarkBrowser::new(bookmarks, config.bookmarks.clone()));

        Self {
            config: Arc::new(config),
            favicons,
            background,
            renderer,
            bookmarks,
        }
    }
}

/// Create application state backed by files under the configured data dir.
///
/// The stored background is rendered once so the first request sees it.
pub async fn create_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let kv = Arc::new(JsonFileKvStore::open(config.storage.kv_path()).await?);
    let blobs = Arc::new(FileBlobStore::new(config.storage.blob_dir()));

    let bookmarks: Arc<dyn BookmarkStore> = match &config.bookmarks.file {
        Some(path) => Arc::new(InMemoryBookmarkStore::load(path).await?),
        None => Arc::new(InMemoryBookmarkStore::with_default_tree()),
    };

    let fetcher = Arc::new(
        HttpFetcher::new(&config.favicon)
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?,
    );

    let state = AppState::with_stores(config, kv, blobs, bookmarks, fetcher);

    if let Err(e) = state.background.refresh().await {
        tracing::warn!(error = %e, "Failed to restore stored background");
    }

    Ok(state)
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/favicon", get(handle_favicon))
        .route(
            "/api/background",
            get(handle_get_background)
                .put(handle_set_background)
                .delete(handle_reset_background),
        )
        .route("/api/background/fit", put(handle_set_fit))
        .route("/api/background/image/:handle", get(handle_background_image))
        .route("/api/folders/root", get(handle_root_folder))
        .route("/api/folders/:id", get(handle_folder))
        .route("/api/bookmarks/:id", patch(handle_update_bookmark))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(DefaultBodyLimit::max(api::MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_favicon(
    axum::extract::State(state): axum::extract::State<AppState>,
    query: axum::extract::Query<api::FaviconQuery>,
) -> axum::Json<api::FaviconResponse> {
    api::handle_favicon(axum::extract::State(state.favicons), query).await
}

async fn handle_get_background(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<crate::rendering::Presentation>, ApiError> {
    api::handle_get_background(
        axum::extract::State(state.background),
        axum::extract::State(state.renderer),
    )
    .await
}

async fn handle_set_background(
    axum::extract::State(state): axum::extract::State<AppState>,
    body: axum::body::Bytes,
) -> Result<axum::Json<api::BackgroundResponse>, ApiError> {
    api::handle_set_background(
        axum::extract::State(state.background),
        axum::extract::State(state.renderer),
        body,
    )
    .await
}

async fn handle_reset_background(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<crate::rendering::Presentation>, ApiError> {
    api::handle_reset_background(
        axum::extract::State(state.background),
        axum::extract::State(state.renderer),
    )
    .await
}

async fn handle_set_fit(
    axum::extract::State(state): axum::extract::State<AppState>,
    request: axum::Json<api::FitRequest>,
) -> Result<axum::Json<crate::rendering::Presentation>, ApiError> {
    api::handle_set_fit(
        axum::extract::State(state.background),
        axum::extract::State(state.renderer),
        request,
    )
    .await
}

async fn handle_background_image(
    axum::extract::State(state): axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<axum::response::Response, ApiError> {
    api::handle_background_image(axum::extract::State(state.renderer), path).await
}

async fn handle_root_folder(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<crate::services::FolderView>, ApiError> {
    api::handle_root_folder(axum::extract::State(state.bookmarks)).await
}

async fn handle_folder(
    axum::extract::State(state): axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<axum::Json<crate::services::FolderView>, ApiError> {
    api::handle_folder(axum::extract::State(state.bookmarks), path).await
}

async fn handle_update_bookmark(
    axum::extract::State(state): axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
    changes: axum::Json<crate::models::BookmarkChanges>,
) -> Result<axum::Json<crate::models::Bookmark>, ApiError> {
    api::handle_update_bookmark(axum::extract::State(state.bookmarks), path, changes).await
}
