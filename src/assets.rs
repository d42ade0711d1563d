//! Config loading with an embedded fallback
//!
//! - If `CONFIG_FILE` is NOT set: use the embedded `config.yaml`
//! - If `CONFIG_FILE` IS set but missing: use the embedded config (and `init` can write it)
//! - If `CONFIG_FILE` IS set and exists: use the file

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Embedded default config
#[derive(RustEmbed)]
#[folder = "."]
#[include = "config.yaml"]
struct EmbeddedConfig;

const CONFIG_NAME: &str = "config.yaml";

/// Where the active configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Embedded => f.write_str("embedded"),
        }
    }
}

/// Config loader with optional filesystem override
pub struct AssetLoader {
    /// External config file path (from CONFIG_FILE env var)
    config_file: Option<PathBuf>,
}

impl AssetLoader {
    /// `config_file` should be `Some` only if CONFIG_FILE was set.
    pub fn new(config_file: Option<PathBuf>) -> Self {
        Self { config_file }
    }

    /// Build a loader from the CONFIG_FILE environment variable
    pub fn from_env() -> Self {
        Self::new(std::env::var("CONFIG_FILE").ok().map(PathBuf::from))
    }

    /// Which config `read_config` will return
    pub fn config_source(&self) -> ConfigSource {
        match self.config_file {
            Some(ref path) if path.exists() => ConfigSource::File(path.clone()),
            _ => ConfigSource::Embedded,
        }
    }

    /// Read the config file
    ///
    /// If an external path is configured and exists, uses that.
    /// Otherwise falls back to embedded config.
    pub fn read_config(&self) -> io::Result<Cow<'static, [u8]>> {
        if let ConfigSource::File(path) = self.config_source() {
            tracing::trace!(path = %path.display(), "Loading config from filesystem");
            return Ok(Cow::Owned(fs::read(&path)?));
        }

        EmbeddedConfig::get(CONFIG_NAME)
            .map(|f| {
                tracing::trace!("Loading config from embedded assets");
                f.data
            })
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found")
            })
    }

    /// Read config as a UTF-8 string
    pub fn read_config_string(&self) -> io::Result<String> {
        let bytes = self.read_config()?;
        String::from_utf8(bytes.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the embedded config to `target` (or the configured path).
    ///
    /// Returns `Ok(false)` when the file exists and `force` is not set.
    pub fn init(&self, target: Option<&Path>, force: bool) -> io::Result<bool> {
        let path = target
            .map(Path::to_path_buf)
            .or_else(|| self.config_file.clone())
            .unwrap_or_else(|| PathBuf::from(CONFIG_NAME));

        if path.exists() && !force {
            return Ok(false);
        }

        let data = EmbeddedConfig::get(CONFIG_NAME).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found")
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, data.data.as_ref())?;
        tracing::info!(path = %path.display(), "Wrote default config");
        Ok(true)
    }
}
