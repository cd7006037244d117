//! Version control checkout boundaries
//!
//! A requested package is usually a subdirectory of a larger checkout.
//! Freshness is stamped over the whole checkout, so the checkout's top
//! directory has to be found first.

use crate::error::{ProxyError, ProxyResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Subversion keeps metadata in every directory of older checkouts
pub const LEGACY_VCS_DIR: &str = ".svn";

/// Metadata directories that only appear at the top of a checkout
pub const VCS_DIRS: &[&str] = &[".hg", ".git", ".bzr"];

/// Whether `name` is any version control metadata directory
pub fn is_vcs_dir(name: &str) -> bool {
    name == LEGACY_VCS_DIR || VCS_DIRS.contains(&name)
}

fn has_dir(dir: &Path, name: &str) -> bool {
    dir.join(name).is_dir()
}

/// Find the top directory of the checkout containing `start`.
///
/// Climbs until a directory holds `.hg`, `.git` or `.bzr`. A run of
/// directories holding `.svn` is climbed through; the first directory above
/// that run without `.svn` ends the climb and the last `.svn` directory is
/// the root.
pub fn locate_root(start: &Path) -> ProxyResult<PathBuf> {
    let mut root = start.to_path_buf();
    let mut check = start.to_path_buf();
    let mut saw_legacy = false;

    loop {
        if has_dir(&check, LEGACY_VCS_DIR) {
            saw_legacy = true;
        } else if saw_legacy {
            break;
        }

        root = check.clone();
        if VCS_DIRS.iter().any(|vcs| has_dir(&check, vcs)) {
            break;
        }

        match check.parent() {
            Some(parent) => check = parent.to_path_buf(),
            None => {
                return Err(ProxyError::VcsRootConfused {
                    start: start.to_path_buf(),
                })
            }
        }
    }

    debug!("root of {} is {}", start.display(), root.display());
    Ok(root)
}
