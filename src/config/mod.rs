//! Loading and saving `config.toml`
//!
//! The file is optional. A missing file means every section keeps its
//! defaults, and `serve` flags are layered on top afterwards.

pub mod schema;

pub use schema::Config;

use crate::error::{ProxyError, ProxyResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Reads and writes the proxy's TOML config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user config file
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Manager for an explicit file, e.g. from `--config` or `PKGPROXY_CONFIG`
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/pkgproxy/config.toml`, or `./pkgproxy/config.toml` when
    /// the platform has no config dir
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pkgproxy")
            .join("config.toml")
    }

    /// Load the config file, or the defaults when there is none
    pub async fn load(&self) -> ProxyResult<Config> {
        if !self.config_path.exists() {
            debug!("No config at {}, using defaults", self.config_path.display());
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Parse `path`; parse failures name the file
    pub async fn load_from_file(&self, path: &Path) -> ProxyResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ProxyError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| ProxyError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write `config` out, creating the parent directory first
    pub async fn save(&self, config: &Config) -> ProxyResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ProxyError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> ProxyResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ProxyError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Path this manager reads and writes
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
