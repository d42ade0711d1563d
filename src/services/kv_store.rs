use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Key-value entries as read from or written to a store
pub type Entries = HashMap<String, Value>;

/// Flat string-keyed store for favicon cache entries and background metadata
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the given keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Entries, StoreError>;

    /// Create or overwrite every entry in `entries`
    async fn set(&self, entries: Entries) -> Result<(), StoreError>;

    /// Remove the given keys. Missing keys are ignored.
    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Fetch a single key
    async fn get_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut entries = self.get(&[key]).await?;
        Ok(entries.remove(key))
    }
}

fn select(entries: &HashMap<String, Value>, keys: &[&str]) -> Entries {
    keys.iter()
        .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// In-memory key-value store
pub struct InMemoryKvStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKvStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries, StoreError> {
        let entries = self.entries.read().await;
        Ok(select(&entries, keys))
    }

    async fn set(&self, new_entries: Entries) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.extend(new_entries);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Key-value store persisted as a single JSON document.
///
/// Every write produces the full new document first, replaces the file via
/// a temp file + rename, and only then updates the in-memory view, so a
/// failed write leaves both the file and the view unchanged.
pub struct JsonFileKvStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, Value>>,
}

impl JsonFileKvStore {
    /// Open (or lazily create) the store at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => HashMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "Opened key-value store"
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &HashMap<String, Value>) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(entries)?;
        write_atomically(&self.path, &content).await
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKvStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries, StoreError> {
        let entries = self.entries.read().await;
        Ok(select(&entries, keys))
    }

    async fn set(&self, new_entries: Entries) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.extend(new_entries);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        if !keys.iter().any(|k| entries.contains_key(*k)) {
            return Ok(());
        }
        let mut next = entries.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}

/// Replace `path` with `content` via a sibling temp file and rename
pub(crate) async fn write_atomically(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
