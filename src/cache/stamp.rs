//! Subtree stamping
//!
//! Writes a freshness marker into every directory of a checkout so that any
//! package inside it is served from disk until the window runs out.

use crate::cache::markers::MarkerStore;
use crate::cache::vcs::is_vcs_dir;
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

fn is_vcs_metadata(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_str().is_some_and(is_vcs_dir)
}

/// Stamp `root` and every directory below it, skipping VCS metadata.
///
/// Unreadable entries and failed stamps are logged and skipped. Returns the
/// number of directories stamped.
pub fn stamp_tree(markers: &MarkerStore, root: &Path) -> usize {
    let mut stamped = 0;

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_vcs_metadata(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        match markers.stamp(entry.path()) {
            Ok(()) => stamped += 1,
            Err(e) => debug!("Failed to stamp {}: {}", entry.path().display(), e),
        }
    }

    debug!("Stamped {} directories under {}", stamped, root.display());
    stamped
}
