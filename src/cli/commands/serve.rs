//! Serve command - run the HTTP proxy

use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::error::ProxyResult;
use crate::server::{self, AppState, ListenAddr};
use std::sync::Arc;

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(args: &ServeArgs, config: &Config) -> Config {
    let mut config = config.clone();
    if let Some(ref listen) = args.listen {
        config.server.listen = listen.clone();
    }
    if let Some(ref root) = args.source_root {
        config.source.root = Some(root.clone());
    }
    if let Some(secs) = args.freshness_secs {
        config.fetch.freshness_secs = secs;
    }
    if args.timeout_secs.is_some() {
        config.fetch.timeout_secs = args.timeout_secs;
    }
    config
}

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> ProxyResult<()> {
    let config = apply_overrides(&args, config);
    let state = Arc::new(AppState::from_config(&config)?);

    let addr = ListenAddr::parse(&config.server.listen);
    let listener = addr.bind().await?;

    server::serve(listener, state).await
}
