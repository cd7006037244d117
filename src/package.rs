//! Package keys and their on-disk locations

use crate::error::{ProxyError, ProxyResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Slash-delimited package identifier, e.g. `github.com/org/repo/subpkg`
///
/// Keys are validated on construction so joining one onto the source root
/// can never escape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageKey(String);

impl PackageKey {
    /// Validate and wrap a package key
    pub fn new(key: impl Into<String>) -> ProxyResult<Self> {
        let key = key.into();
        let invalid = |reason: &str| ProxyError::InvalidPackageKey {
            key: key.clone(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(invalid("empty"));
        }
        if key.starts_with('/') || key.ends_with('/') {
            return Err(invalid("leading or trailing slash"));
        }
        if key.contains('\\') || key.contains('\0') {
            return Err(invalid("forbidden character"));
        }
        if key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(invalid("empty or relative segment"));
        }
        // A leading dash would reach the retrieval command as a flag
        if key.split('/').any(|segment| segment.starts_with('-')) {
            return Err(invalid("segment starts with '-'"));
        }

        Ok(Self(key))
    }

    /// The key as passed to the retrieval command
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory this package lives in under `source_root`
    pub fn dir(&self, source_root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(source_root.to_path_buf(), |dir, segment| dir.join(segment))
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
