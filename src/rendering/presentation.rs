use crate::models::{BackgroundMetadata, FitMode};
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Route prefix under which live image handles are served
pub const IMAGE_URL_PREFIX: &str = "/api/background/image";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render failed: {0}")]
    Failed(String),
}

/// Current background asset plus its metadata, as handed to a renderer
#[derive(Debug, Clone, Default)]
pub struct BackgroundSnapshot {
    pub asset: Option<Arc<[u8]>>,
    pub metadata: BackgroundMetadata,
}

/// Receives the background state after every change
#[async_trait]
pub trait BackgroundRenderer: Send + Sync {
    async fn refresh(&self, snapshot: &BackgroundSnapshot) -> Result<(), RenderError>;
}

/// What the page applies to its body
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// Reference to the live image, absent when no background is set
    pub image_url: Option<String>,
    /// CSS `background-size`
    pub background_size: Option<String>,
    /// CSS color shown around and behind the image
    pub background_color: Option<String>,
    /// Apply the dark theme class
    pub dark_background: bool,
    /// Stored fit preference, also reported when no image is set
    pub fit: FitMode,
}

/// Map a snapshot to a presentation.
///
/// `image_url` is the reference registered for the snapshot's asset and is
/// ignored when there is no asset.
pub fn present(snapshot: &BackgroundSnapshot, image_url: Option<String>) -> Presentation {
    let metadata = &snapshot.metadata;
    match (&snapshot.asset, image_url) {
        (Some(_), Some(url)) => Presentation {
            image_url: Some(url),
            background_size: Some(metadata.fit_mode.background_size().to_string()),
            background_color: metadata.average_color.map(|c| c.to_css()),
            dark_background: metadata.is_dark,
            fit: metadata.fit_mode,
        },
        _ => Presentation {
            fit: metadata.fit_mode,
            ..Presentation::default()
        },
    }
}

/// Content-addressed handle for an asset: first 16 bytes of SHA-256, hex
pub fn image_handle(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..16])
}

/// Transient references to image bytes
#[derive(Default)]
pub struct ImageHandles {
    live: HashMap<String, Arc<[u8]>>,
}

impl ImageHandles {
    pub fn register(&mut self, bytes: Arc<[u8]>) -> String {
        let handle = image_handle(&bytes);
        self.live.insert(handle.clone(), bytes);
        handle
    }

    pub fn revoke(&mut self, handle: &str) -> bool {
        self.live.remove(handle).is_some()
    }

    pub fn get(&self, handle: &str) -> Option<Arc<[u8]>> {
        self.live.get(handle).cloned()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[derive(Default)]
struct RenderState {
    handles: ImageHandles,
    current_handle: Option<String>,
    presentation: Presentation,
}

/// Renderer that keeps the current presentation for the HTTP layer and
/// serves the image behind at most one live handle.
pub struct PresentationRenderer {
    url_prefix: String,
    state: RwLock<RenderState>,
}

impl PresentationRenderer {
    pub fn new(url_prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            state: RwLock::new(RenderState::default()),
        }
    }

    pub async fn current(&self) -> Presentation {
        self.state.read().await.presentation.clone()
    }

    /// Bytes behind a live handle
    pub async fn image(&self, handle: &str) -> Option<Arc<[u8]>> {
        self.state.read().await.handles.get(handle)
    }

    /// Number of live handles (0 or 1)
    pub async fn live_handles(&self) -> usize {
        self.state.read().await.handles.len()
    }
}

impl Default for PresentationRenderer {
    fn default() -> Self {
        Self::new(IMAGE_URL_PREFIX)
    }
}

#[async_trait]
impl BackgroundRenderer for PresentationRenderer {
    async fn refresh(&self, snapshot: &BackgroundSnapshot) -> Result<(), RenderError> {
        let mut state = self.state.write().await;

        if let Some(old) = state.current_handle.take() {
            state.handles.revoke(&old);
        }

        let image_url = snapshot.asset.as_ref().map(|asset| {
            let handle = state.handles.register(asset.clone());
            let url = format!("{}/{}", self.url_prefix.trim_end_matches('/'), handle);
            state.current_handle = Some(handle);
            url
        });

        state.presentation = present(snapshot, image_url);

        tracing::debug!(
            image = ?state.presentation.image_url,
            dark = state.presentation.dark_background,
            fit = state.presentation.fit.as_str(),
            "Background presentation refreshed"
        );
        Ok(())
    }
}
