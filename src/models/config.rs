use crate::assets::AssetLoader;
use crate::models::IconSource;
use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Where persistent state lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// Favicon source chain and HTTP client settings
    #[serde(default)]
    pub favicon: FaviconConfig,

    /// Bookmark tree location and root folder
    #[serde(default)]
    pub bookmarks: BookmarksConfig,
}

/// Persistent storage locations
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for the key-value file and the blob directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// JSON document backing the key-value store
    pub fn kv_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }

    /// Directory backing the blob store
    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}

/// Favicon resolution settings
#[derive(Debug, Deserialize, Clone)]
pub struct FaviconConfig {
    /// Remote sources, tried in order
    #[serde(default = "IconSource::defaults")]
    pub sources: Vec<IconSource>,

    /// Total request timeout per source in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout per source in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest icon body accepted from a source; larger responses are a miss
    #[serde(default = "default_max_icon_bytes")]
    pub max_icon_bytes: usize,
}

fn default_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_max_icon_bytes() -> usize {
    512 * 1024
}

fn default_user_agent() -> String {
    format!("newtab/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            sources: IconSource::defaults(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
            max_icon_bytes: default_max_icon_bytes(),
        }
    }
}

/// Bookmark tree settings
#[derive(Debug, Deserialize, Clone)]
pub struct BookmarksConfig {
    /// JSON bookmark tree; a built-in empty tree is used when unset
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Title of the folder shown first
    #[serde(default = "default_root_folder")]
    pub root_folder: String,

    /// Header title shown for the root folder
    #[serde(default = "default_root_title")]
    pub root_title: String,

    /// Children shown in a folder tile's preview
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
}

fn default_root_folder() -> String {
    "Bookmarks Toolbar".to_string()
}

fn default_root_title() -> String {
    "Favorites".to_string()
}

fn default_preview_limit() -> usize {
    9
}

impl Default for BookmarksConfig {
    fn default() -> Self {
        Self {
            file: None,
            root_folder: default_root_folder(),
            root_title: default_root_title(),
            preview_limit: default_preview_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    tracing::info!(
                        sources = config.favicon.sources.len(),
                        data_dir = %config.storage.data_dir.display(),
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Apply `DATA_DIR` and `BOOKMARKS_FILE` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(file) = std::env::var("BOOKMARKS_FILE") {
            self.bookmarks.file = Some(PathBuf::from(file));
        }
        self
    }
}
