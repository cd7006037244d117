//! pkgproxy - lazy source package proxy
//!
//! Fetches source package trees on first request, keeps them on disk, and
//! serves them again until a freshness window expires.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod package;
pub mod server;

pub use error::{ProxyError, ProxyResult};
pub use package::PackageKey;
