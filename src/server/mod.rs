//! HTTP front end
//!
//! Every path is handled by one fallback route: the path names a package
//! (served as a tar) or a source file inside one (served as plain text).

pub mod archive;
pub mod listener;
pub mod request;

pub use listener::ListenAddr;
pub use request::{decode_path, resolve, RequestTarget};

use crate::cache::{FetchCoordinator, MarkerStore};
use crate::config::Config;
use crate::error::{ProxyError, ProxyResult};
use crate::fetch::{CommandFetcher, Fetcher};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

const PLACEHOLDER_PAGE: &str = "<html><body>go get proxy</body></html>";
const TAR_CONTENT_TYPE: &str = "application/x-tar";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Size of the chunks a tar stream is sent in
const TAR_CHUNK_SIZE: usize = 32 * 1024;

/// Shared state for request handlers
pub struct AppState {
    pub coordinator: Arc<FetchCoordinator>,
    pub suffixes: Vec<String>,
}

impl AppState {
    /// Create state around an existing coordinator
    pub fn new(coordinator: Arc<FetchCoordinator>, suffixes: Vec<String>) -> Self {
        Self {
            coordinator,
            suffixes,
        }
    }

    /// Build state from configuration with a custom fetcher
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetcher>) -> ProxyResult<Self> {
        let root = config.source_root()?;
        let markers = MarkerStore::new(root, config.fetch.freshness_window());
        let coordinator = FetchCoordinator::new(markers, fetcher)
            .with_recheck_after_gate(config.fetch.recheck_after_gate);

        Ok(Self::new(
            Arc::new(coordinator),
            config.source.suffixes.clone(),
        ))
    }

    /// Build state from configuration, fetching with the configured command
    pub fn from_config(config: &Config) -> ProxyResult<Self> {
        let fetcher = Arc::new(CommandFetcher::from_config(&config.fetch));
        Self::with_fetcher(config, fetcher)
    }
}

/// Build the proxy router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on `listener` until ctrl-c
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> ProxyResult<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| ProxyError::io("reading listener address", e))?;
    info!("Listening on {}; serving {}", addr, state.coordinator.markers().root().display());

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ProxyError::io("serving HTTP", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn proxy(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let target = match decode_path(uri.path()).and_then(|path| resolve(&path, &state.suffixes)) {
        Ok(target) => target,
        Err(e) => {
            warn!("invalid requested path {:?}", uri.path());
            return plain_error(e.to_string());
        }
    };

    match target {
        RequestTarget::Empty => StatusCode::OK.into_response(),
        RequestTarget::Placeholder => Html(PLACEHOLDER_PAGE).into_response(),
        RequestTarget::Package { key, file } => {
            let dir = match state.coordinator.ensure(&key).await {
                Ok(dir) => dir,
                Err(e) => return plain_error(e.to_string()),
            };
            match file {
                None => tar_response(dir),
                Some(file) => file_response(dir.join(file)).await,
            }
        }
    }
}

fn plain_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
        message,
    )
        .into_response()
}

async fn file_response(path: PathBuf) -> Response {
    match tokio::fs::read(&path).await {
        Ok(contents) => ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], contents).into_response(),
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            plain_error(e.to_string())
        }
    }
}

/// Stream a tar of `dir`; errors after this point can only be logged
fn tar_response(dir: PathBuf) -> Response {
    let (tx, rx) = mpsc::channel::<io::Result<Vec<u8>>>(4);

    tokio::task::spawn_blocking(move || {
        let mut writer = ChannelWriter::new(tx.clone());
        let result = archive::write_tar(&mut writer, &dir).and_then(|entries| {
            writer
                .flush()
                .map_err(|e| ProxyError::io("flushing archive", e))?;
            Ok(entries)
        });
        match result {
            Ok(entries) => debug!("Sent tar of {} ({} entries)", dir.display(), entries),
            Err(e) => {
                error!("Error generating tar of {}: {}", dir.display(), e);
                let _ = tx.blocking_send(Err(io::Error::other(e.to_string())));
            }
        }
    });

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });

    (
        [(header::CONTENT_TYPE, TAR_CONTENT_TYPE)],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Buffers writes and hands them to the response body in chunks
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Vec<u8>>>,
    buf: Vec<u8>,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<io::Result<Vec<u8>>>) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(TAR_CHUNK_SIZE),
        }
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(TAR_CHUNK_SIZE));
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= TAR_CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}
