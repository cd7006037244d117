//! Freshness markers
//!
//! A fetch leaves an empty `.go-get-proxy-last` file in every directory of
//! the fetched checkout. Its modification time is the only record of when
//! the tree was last brought up to date.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Name of the sentinel file written into fetched directories
pub const MARKER_FILE: &str = ".go-get-proxy-last";

/// Default window a stamped tree is reused for
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60);

/// Reads and writes freshness markers below a source root
#[derive(Debug, Clone)]
pub struct MarkerStore {
    root: PathBuf,
    window: Duration,
}

impl MarkerStore {
    /// Create a store for `root` with the given freshness window
    pub fn new(root: impl Into<PathBuf>, window: Duration) -> Self {
        Self {
            root: root.into(),
            window,
        }
    }

    /// The managed source root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The freshness window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether `dir`, or an ancestor up to and including the source root,
    /// carries a marker younger than the freshness window.
    pub fn is_fresh(&self, dir: &Path) -> bool {
        if !dir.starts_with(&self.root) {
            return false;
        }

        let now = SystemTime::now();
        for candidate in dir.ancestors() {
            if !candidate.starts_with(&self.root) {
                break;
            }
            if let Some(modified) = marker_mtime(candidate) {
                // A marker from the future still counts
                let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
                if age < self.window {
                    debug!("Dir {} is new enough", candidate.display());
                    return true;
                }
            }
        }
        false
    }

    /// Replace the marker in `dir` with a new, empty one
    pub fn stamp(&self, dir: &Path) -> io::Result<()> {
        let marker = dir.join(MARKER_FILE);
        match fs::remove_file(&marker) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::File::create(&marker).map(|_| ())
    }
}

fn marker_mtime(dir: &Path) -> Option<SystemTime> {
    fs::metadata(dir.join(MARKER_FILE))
        .and_then(|meta| meta.modified())
        .ok()
}
