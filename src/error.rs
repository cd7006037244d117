//! Error types for pkgproxy
//!
//! All modules use `ProxyResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pkgproxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

/// All errors that can occur in pkgproxy
#[derive(Error, Debug)]
pub enum ProxyError {
    // Request errors
    #[error("invalid path")]
    InvalidPath(String),

    #[error("Invalid package key {key:?}: {reason}")]
    InvalidPackageKey { key: String, reason: String },

    // Fetch errors
    #[error("Error fetching package {package:?}: {reason}\n\nOutput:\n{output}")]
    FetchFailed {
        package: String,
        reason: String,
        output: String,
    },

    #[error("Fetch of package {package:?} timed out after {secs}s")]
    FetchTimeout { package: String, secs: u64 },

    #[error("Confused; no version control root found above {}", .start.display())]
    VcsRootConfused { start: PathBuf },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No source root configured and GOPATH is not set")]
    SourceRootUnset,

    // Listener errors
    #[error("Listen on {addr:?}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Inherited listener {name:?}: {reason}")]
    ListenFd { name: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch failure carrying the command's combined output
    pub fn fetch_failed(
        package: impl Into<String>,
        reason: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::FetchFailed {
            package: package.into(),
            reason: reason.into(),
            output: output.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SourceRootUnset => Some("Set GOPATH or [source] root in the config file"),
            Self::ListenFd { .. } => {
                Some("envfd:NAME expects RUNSIT_PORTFD_NAME to hold an open socket descriptor")
            }
            Self::Listen { .. } => Some("Check that the port is free, or pass --listen"),
            _ => None,
        }
    }
}
