use crate::error::{DecodeError, StoreError};
use crate::models::{keys, BackgroundMetadata, FitMode};
use crate::rendering::{analyze_in_background, BackgroundRenderer, BackgroundSnapshot, PixelStats};
use crate::services::blob_store::BlobStore;
use crate::services::kv_store::{Entries, KeyValueStore};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("Failed to persist background: {0}")]
    Persist(#[from] StoreError),

    #[error("Unreadable background image: {0}")]
    Decode(#[from] DecodeError),
}

/// Owns the lifecycle of the user's background image and its metadata.
///
/// Writes follow compute-then-commit: the image is analyzed before anything
/// is stored, so an undecodable upload leaves the previous background intact.
/// Mutations are serialized so the stored asset and its metadata always
/// describe the same image.
pub struct BackgroundManager {
    kv: Arc<dyn KeyValueStore>,
    blobs: Arc<dyn BlobStore>,
    renderer: Arc<dyn BackgroundRenderer>,
    write_lock: Mutex<()>,
}

impl BackgroundManager {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        blobs: Arc<dyn BlobStore>,
        renderer: Arc<dyn BackgroundRenderer>,
    ) -> Self {
        Self {
            kv,
            blobs,
            renderer,
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the background with `image` and refresh the renderer.
    ///
    /// Any previously chosen fit mode is kept.
    pub async fn set_background(
        &self,
        image: impl Into<Arc<[u8]>>,
    ) -> Result<PixelStats, BackgroundError> {
        let image: Arc<[u8]> = image.into();
        let stats = analyze_in_background(image.clone()).await?;

        let _guard = self.write_lock.lock().await;
        let fit_mode = self.fit_mode().await?;
        let previous = self.blobs.get(keys::BACKGROUND_IMAGE).await?;

        self.blobs.put(keys::BACKGROUND_IMAGE, image.clone()).await?;

        let metadata = BackgroundMetadata {
            fit_mode,
            is_dark: stats.is_dark(),
            average_color: Some(stats.average_color),
        };
        if let Err(e) = self.kv.set(metadata.to_entries()).await {
            self.restore_asset(previous).await;
            return Err(e.into());
        }

        tracing::info!(
            bytes = image.len(),
            luminance = stats.average_luminance,
            dark = metadata.is_dark,
            color = %stats.average_color,
            "Background set"
        );

        self.render(BackgroundSnapshot {
            asset: Some(image),
            metadata,
        })
        .await;
        Ok(stats)
    }

    /// Remove the background and all of its metadata. A no-op when unset.
    ///
    /// Metadata goes first and is written back if the asset cannot be
    /// deleted, so metadata never outlives its asset.
    pub async fn reset_background(&self) -> Result<(), BackgroundError> {
        let _guard = self.write_lock.lock().await;
        let saved = self.kv.get(&keys::METADATA).await?;
        self.kv.remove(&keys::METADATA).await?;

        if let Err(e) = self.blobs.delete(keys::BACKGROUND_IMAGE).await {
            self.restore_metadata(saved).await;
            return Err(e.into());
        }

        tracing::info!("Background reset");
        self.render(BackgroundSnapshot::default()).await;
        Ok(())
    }

    /// Record the fit preference. The renderer is refreshed only when an
    /// asset is present.
    pub async fn set_fit_mode(&self, mode: FitMode) -> Result<(), BackgroundError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = Entries::new();
        entries.insert(
            keys::FIT_MODE.to_string(),
            Value::String(mode.as_str().to_string()),
        );
        self.kv.set(entries).await?;
        tracing::debug!(fit = mode.as_str(), "Fit mode stored");

        if self.blobs.exists(keys::BACKGROUND_IMAGE).await? {
            let snapshot = self.snapshot().await?;
            self.render(snapshot).await;
        }
        Ok(())
    }

    /// Current asset and metadata as stored
    pub async fn snapshot(&self) -> Result<BackgroundSnapshot, BackgroundError> {
        let asset = self.blobs.get(keys::BACKGROUND_IMAGE).await?;
        let entries = self.kv.get(&keys::METADATA).await?;
        Ok(BackgroundSnapshot {
            asset,
            metadata: BackgroundMetadata::from_entries(&entries),
        })
    }

    /// Re-render from stored state, e.g. at startup
    pub async fn refresh(&self) -> Result<(), BackgroundError> {
        let snapshot = self.snapshot().await?;
        self.render(snapshot).await;
        Ok(())
    }

    /// Stored fit preference, `cover` when unset
    pub async fn fit_mode(&self) -> Result<FitMode, BackgroundError> {
        let value = self.kv.get_value(keys::FIT_MODE).await?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .and_then(FitMode::parse)
            .unwrap_or_default())
    }

    async fn restore_asset(&self, previous: Option<Arc<[u8]>>) {
        let result = match previous {
            Some(bytes) => self.blobs.put(keys::BACKGROUND_IMAGE, bytes).await,
            None => self.blobs.delete(keys::BACKGROUND_IMAGE).await,
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to roll back background asset");
        }
    }

    async fn restore_metadata(&self, saved: Entries) {
        if saved.is_empty() {
            return;
        }
        if let Err(e) = self.kv.set(saved).await {
            tracing::error!(error = %e, "Failed to roll back background metadata");
        }
    }

    async fn render(&self, snapshot: BackgroundSnapshot) {
        if let Err(e) = self.renderer.refresh(&snapshot).await {
            tracing::warn!(error = %e, "Background renderer refresh failed");
        }
    }
}
