//! On-disk package cache
//!
//! Fetched package trees stay under the source root forever; only their
//! freshness expires.
//!
//! # Freshness
//!
//! | State | Served from | Description |
//! |-------|-------------|-------------|
//! | Missing | fetch | Never fetched, or the last fetch failed |
//! | Stale | fetch | Marker older than the window |
//! | Fresh | disk | Marker in the directory or an ancestor within the window |

pub mod coordinator;
pub mod markers;
pub mod stamp;
pub mod vcs;

pub use coordinator::FetchCoordinator;
pub use markers::{MarkerStore, DEFAULT_FRESHNESS, MARKER_FILE};
pub use stamp::stamp_tree;
pub use vcs::{is_vcs_dir, locate_root};
