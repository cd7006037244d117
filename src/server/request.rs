//! Request path resolution
//!
//! Turns a URL path into what the proxy should serve. Only canonical paths
//! are accepted, so a key can never walk out of the source root.

use crate::error::{ProxyError, ProxyResult};
use crate::package::PackageKey;
use percent_encoding::percent_decode_str;

/// What a request path asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// `/favicon.ico`, `/robots.txt`: empty 200
    Empty,
    /// `/` and other one-character paths: static landing page
    Placeholder,
    /// A package archive, or one file inside the package
    Package {
        key: PackageKey,
        file: Option<String>,
    },
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated slashes, drops `.` segments, resolves `..` against
/// the preceding segment and strips any trailing slash. `..` cannot climb
/// above a leading `/`.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Decode percent escapes in a raw URI path.
///
/// Escaped segments such as `%2e%2e` must be checked in their decoded form.
pub fn decode_path(raw: &str) -> ProxyResult<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|path| path.into_owned())
        .map_err(|_| ProxyError::InvalidPath(raw.to_string()))
}

/// Resolve a request path against the single-file `suffixes`
pub fn resolve(path: &str, suffixes: &[String]) -> ProxyResult<RequestTarget> {
    match path {
        "/favicon.ico" | "/robots.txt" => return Ok(RequestTarget::Empty),
        _ => {}
    }
    if path.len() < 2 {
        return Ok(RequestTarget::Placeholder);
    }

    let invalid = || ProxyError::InvalidPath(path.to_string());
    if !path.starts_with('/') || clean_path(path) != path {
        return Err(invalid());
    }

    let (dir, file) = path.rsplit_once('/').ok_or_else(invalid)?;
    let (key, file) = if suffixes.iter().any(|suffix| file.ends_with(suffix.as_str())) {
        (&dir[dir.len().min(1)..], Some(file.to_string()))
    } else {
        (&path[1..], None)
    };

    let key = PackageKey::new(key).map_err(|_| invalid())?;
    Ok(RequestTarget::Package { key, file })
}
