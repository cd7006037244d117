//! Configuration schema for pkgproxy
//!
//! Configuration is stored at `~/.config/pkgproxy/config.toml`

use crate::error::{ProxyError, ProxyResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Source tree settings
    pub source: SourceConfig,

    /// Retrieval command settings
    pub fetch: FetchConfig,
}

impl Config {
    /// Resolve the directory packages are fetched into.
    ///
    /// Falls back to `$GOPATH/src` when no root is configured.
    pub fn source_root(&self) -> ProxyResult<PathBuf> {
        if let Some(ref root) = self.source.root {
            return Ok(root.clone());
        }
        match std::env::var_os("GOPATH") {
            Some(gopath) if !gopath.is_empty() => Ok(PathBuf::from(gopath).join("src")),
            _ => Err(ProxyError::SourceRootUnset),
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port, ip:port, or `envfd:NAME`
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: ":8080".to_string(),
        }
    }
}

/// Source tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory packages are fetched into (default: $GOPATH/src)
    pub root: Option<PathBuf>,

    /// File suffixes that are served as single files instead of archives
    pub suffixes: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: None,
            suffixes: vec![".go".to_string()],
        }
    }
}

/// Retrieval command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Program that fetches a package
    pub program: String,

    /// Arguments placed before the package key
    pub args: Vec<String>,

    /// Seconds a fetched tree is reused without fetching again
    pub freshness_secs: u64,

    /// Kill the retrieval command after N seconds (unset = wait forever)
    pub timeout_secs: Option<u64>,

    /// Check freshness again after waiting for another fetch of the same package
    pub recheck_after_gate: bool,
}

impl FetchConfig {
    /// Freshness window as a duration
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }

    /// Retrieval timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            args: vec!["get".to_string(), "-u".to_string(), "-d".to_string()],
            freshness_secs: 60,
            timeout_secs: None,
            recheck_after_gate: false,
        }
    }
}
