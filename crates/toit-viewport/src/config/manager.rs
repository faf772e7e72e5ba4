//! Loading, saving and sharing the viewport configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::ViewportConfig;

/// Shared configuration manager type
pub type SharedConfig = Arc<RwLock<ConfigManager>>;

/// Configuration error types
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Owns the current configuration and the file it is persisted to
#[derive(Debug)]
pub struct ConfigManager {
    config: ViewportConfig,
    config_path: PathBuf,
    dirty: bool,
}

impl ConfigManager {
    /// Create a manager backed by the per-user config file, loading it if present
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Create a manager backed by `path`, loading it if present
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let config_path = path.into();
        let config = match Self::load_from_path(&config_path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::info!("No config file found, using defaults");
                ViewportConfig::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load config file, using defaults: {}", e);
                ViewportConfig::new()
            }
        };

        Self {
            config,
            config_path,
            dirty: false,
        }
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("toit")
            .join("viewport.ron")
    }

    /// Read a config file. A missing file is `Ok(None)`.
    pub fn load_from_path(path: &Path) -> Result<Option<ViewportConfig>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io(e.to_string())),
        };
        let config = ron::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(Some(config))
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Mutable access to the configuration (marks it dirty)
    pub fn config_mut(&mut self) -> &mut ViewportConfig {
        self.dirty = true;
        &mut self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the configuration to disk if it has unsaved changes
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = ron::ser::to_string_pretty(&self.config, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(&self.config_path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::info!("Saved config to {:?}", self.config_path);
        self.dirty = false;
        Ok(())
    }

    pub fn reset_to_defaults(&mut self) {
        self.config = ViewportConfig::new();
        self.dirty = true;
    }

    pub fn config_file_path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new shared configuration manager backed by the per-user config file
pub fn create_shared_config() -> SharedConfig {
    Arc::new(RwLock::new(ConfigManager::new()))
}
