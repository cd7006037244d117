//! Package retrieval abstraction
//!
//! The coordinator does not care how a package lands on disk, only that
//! after a successful fetch its directory exists under the source root.

use crate::error::ProxyResult;
use crate::package::PackageKey;
use async_trait::async_trait;

/// Abstract package retrieval interface
///
/// Implementations must populate `<source_root>/<key>` on success. On
/// failure they return `ProxyError::FetchFailed` carrying whatever output
/// the retrieval produced.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download or update `key` and its dependencies without building
    async fn fetch(&self, key: &PackageKey) -> ProxyResult<()>;

    /// Human-readable name for logs
    fn name(&self) -> &str;
}
