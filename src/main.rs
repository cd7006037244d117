//! pkgproxy - lazy source package proxy
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use pkgproxy::cli::{Cli, Commands};
use pkgproxy::config::{Config, ConfigManager};
use pkgproxy::error::ProxyResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging: 0 = info, 1 = debug, 2+ = trace; RUST_LOG wins
fn init_logging(verbose: u8, config: &Config) {
    let default = match verbose {
        0 => "pkgproxy=info,tower_http=info",
        1 => "pkgproxy=debug,tower_http=debug",
        _ => "pkgproxy=trace,tower_http=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> ProxyResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);

    // Dispatch to command
    match cli.command {
        Commands::Serve(args) => pkgproxy::cli::commands::serve(args, &config).await,
        Commands::Config(args) => {
            pkgproxy::cli::commands::config(args, &config_manager, &config).await
        }
    }
}
