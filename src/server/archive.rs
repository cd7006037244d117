//! Tar archives of package directories

use crate::cache::{is_vcs_dir, MARKER_FILE};
use crate::error::{ProxyError, ProxyResult};
use std::io::{self, Write};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

fn is_vcs_metadata(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_str().is_some_and(is_vcs_dir)
}

/// Write a tar of everything below `dir` to `writer`.
///
/// Entry names are relative to `dir`. Version control metadata and
/// freshness markers are left out. Returns the number of entries written.
pub fn write_tar<W: Write>(writer: W, dir: &Path) -> ProxyResult<u64> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_vcs_metadata(entry));

    let mut entries = 0;
    for entry in walker {
        let entry = entry
            .map_err(|e| ProxyError::io(format!("walking {}", dir.display()), io::Error::from(e)))?;
        if entry.file_name() == MARKER_FILE {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| ProxyError::Internal(format!("entry outside archive root: {e}")))?;
        let name = rel.to_string_lossy().replace('\\', "/");

        builder
            .append_path_with_name(entry.path(), &name)
            .map_err(|e| ProxyError::io(format!("archiving {}", entry.path().display()), e))?;
        entries += 1;
    }

    builder
        .finish()
        .map_err(|e| ProxyError::io(format!("finishing archive of {}", dir.display()), e))?;
    Ok(entries)
}
