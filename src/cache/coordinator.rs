//! Fetch coordination
//!
//! Serves fresh package trees straight from disk and otherwise runs the
//! fetcher, one fetch at a time per package. Different packages fetch in
//! parallel.

use crate::cache::markers::MarkerStore;
use crate::cache::stamp::stamp_tree;
use crate::cache::vcs::locate_root;
use crate::error::{ProxyError, ProxyResult};
use crate::fetch::Fetcher;
use crate::package::PackageKey;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

/// Coordinates fetches of package trees below a source root
pub struct FetchCoordinator {
    markers: MarkerStore,
    fetcher: Arc<dyn Fetcher>,
    /// One slot per package key; entries live as long as the coordinator
    pending: DashMap<PackageKey, Arc<Mutex<()>>>,
    recheck_after_gate: bool,
}

impl FetchCoordinator {
    /// Create a coordinator over `markers`' source root
    pub fn new(markers: MarkerStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            markers,
            fetcher,
            pending: DashMap::new(),
            recheck_after_gate: false,
        }
    }

    /// Check freshness again once the gate is held.
    ///
    /// Off by default: a request that queued behind a fetch of the same
    /// package fetches again after it.
    pub fn with_recheck_after_gate(mut self, recheck: bool) -> Self {
        self.recheck_after_gate = recheck;
        self
    }

    /// The marker store this coordinator stamps through
    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    /// Directory `key` is fetched into
    pub fn package_dir(&self, key: &PackageKey) -> PathBuf {
        key.dir(self.markers.root())
    }

    /// Make sure `key` is on disk and recent, fetching it if needed.
    ///
    /// Returns the package directory. The fetch runs on its own task so a
    /// caller that goes away does not abort a retrieval in progress.
    pub async fn ensure(self: &Arc<Self>, key: &PackageKey) -> ProxyResult<PathBuf> {
        let dir = self.package_dir(key);
        if self.is_fresh(&dir).await? {
            return Ok(dir);
        }

        let this = Arc::clone(self);
        let key = key.clone();
        tokio::spawn(async move { this.fetch_gated(&key, dir).await })
            .await
            .map_err(|e| ProxyError::Internal(format!("fetch task failed: {e}")))?
    }

    /// Freshness check on the blocking pool; it stats every ancestor
    async fn is_fresh(&self, dir: &Path) -> ProxyResult<bool> {
        let markers = self.markers.clone();
        let dir = dir.to_path_buf();

        tokio::task::spawn_blocking(move || markers.is_fresh(&dir))
            .await
            .map_err(|e| ProxyError::Internal(format!("freshness check failed: {e}")))
    }

    /// Wait for the single fetch slot of `key`
    async fn gate(&self, key: &PackageKey) -> OwnedMutexGuard<()> {
        let slot = self
            .pending
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        slot.lock_owned().await
    }

    async fn fetch_gated(&self, key: &PackageKey, dir: PathBuf) -> ProxyResult<PathBuf> {
        // Released on every return path when dropped
        let _slot = self.gate(key).await;

        if self.recheck_after_gate && self.is_fresh(&dir).await? {
            debug!("Package {:?} was fetched while waiting", key.as_str());
            return Ok(dir);
        }

        self.fetcher.fetch(key).await?;

        let root = self.stamp_checkout(&dir).await?;
        info!("Stamped checkout {} for {:?}", root.display(), key.as_str());
        Ok(dir)
    }

    /// Locate the checkout containing `dir` and stamp all of it
    async fn stamp_checkout(&self, dir: &Path) -> ProxyResult<PathBuf> {
        let markers = self.markers.clone();
        let start = dir.to_path_buf();

        tokio::task::spawn_blocking(move || -> ProxyResult<PathBuf> {
            let root = locate_root(&start)?;
            stamp_tree(&markers, &root);
            Ok(root)
        })
        .await
        .map_err(|e| ProxyError::Internal(format!("stamp task failed: {e}")))?
    }
}
