//! Listening socket setup
//!
//! Accepts `port`, `:port`, `host:port`, or `envfd:NAME` to adopt a socket
//! a process supervisor already opened and passed down by descriptor
//! number in `RUNSIT_PORTFD_NAME`.

use crate::error::{ProxyError, ProxyResult};
use std::fmt;
use tokio::net::TcpListener;

/// Environment variable prefix for inherited listener descriptors
pub const PORTFD_ENV_PREFIX: &str = "RUNSIT_PORTFD_";

/// Where to accept connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddr {
    /// Bind a new TCP socket
    Tcp(String),
    /// Adopt an inherited socket by supervisor-assigned name
    EnvFd(String),
}

impl ListenAddr {
    /// Parse a `--listen` value
    pub fn parse(value: &str) -> Self {
        if let Some(name) = value.strip_prefix("envfd:") {
            return Self::EnvFd(name.to_string());
        }
        if !value.contains(':') {
            Self::Tcp(format!("0.0.0.0:{value}"))
        } else if value.starts_with(':') {
            Self::Tcp(format!("0.0.0.0{value}"))
        } else {
            Self::Tcp(value.to_string())
        }
    }

    /// Open the listener
    pub async fn bind(&self) -> ProxyResult<TcpListener> {
        match self {
            Self::Tcp(addr) => TcpListener::bind(addr)
                .await
                .map_err(|source| ProxyError::Listen {
                    addr: addr.clone(),
                    source,
                }),
            Self::EnvFd(name) => inherited_listener(name),
        }
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => f.write_str(addr),
            Self::EnvFd(name) => write!(f, "envfd:{name}"),
        }
    }
}

#[cfg(unix)]
fn inherited_listener(name: &str) -> ProxyResult<TcpListener> {
    use std::os::unix::io::{FromRawFd, RawFd};

    let var = format!("{PORTFD_ENV_PREFIX}{name}");
    let fail = |reason: String| ProxyError::ListenFd {
        name: name.to_string(),
        reason,
    };

    let value = std::env::var(&var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| fail(format!("didn't find {var} in environment")))?;
    let fd: RawFd = value
        .trim()
        .parse()
        .map_err(|e| fail(format!("bogus descriptor {value:?}: {e}")))?;
    if fd < 0 {
        return Err(fail(format!("bogus descriptor {value:?}")));
    }

    // SAFETY: the supervisor passed this descriptor for us to own and nothing
    // else in the process has adopted it.
    let listener = unsafe { std::net::TcpListener::from_raw_fd(fd) };
    listener
        .set_nonblocking(true)
        .map_err(|e| fail(format!("descriptor {fd}: {e}")))?;
    TcpListener::from_std(listener).map_err(|e| fail(format!("descriptor {fd}: {e}")))
}

#[cfg(not(unix))]
fn inherited_listener(name: &str) -> ProxyResult<TcpListener> {
    Err(ProxyError::ListenFd {
        name: name.to_string(),
        reason: "inherited descriptors are only supported on unix".to_string(),
    })
}
