use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store for large binary values keyed by name
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<Arc<[u8]>>, StoreError>;

    /// Create or replace a blob
    async fn put(&self, key: &str, data: Arc<[u8]>) -> Result<(), StoreError>;

    /// Delete a blob. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// In-memory blob storage
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Arc<[u8]>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Arc<[u8]>>, StoreError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(key).cloned())
    }

    async fn put(&self, key: &str, data: Arc<[u8]>) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().await;
        blobs.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.blobs.read().await.contains_key(key))
    }
}

/// One file per blob under a directory
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::Invalid(format!("invalid blob key: {key:?}")));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Arc<[u8]>>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Arc::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: Arc<[u8]>) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        super::kv_store::write_atomically(&path, &data).await?;
        tracing::debug!(key, bytes = data.len(), "Stored blob");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
