//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// pkgproxy - lazy source package proxy
///
/// Fetches source packages on first request with an external retrieval
/// command and serves them as tar archives or single files.
#[derive(Parser, Debug)]
#[command(name = "pkgproxy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PKGPROXY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP proxy
    Serve(ServeArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Port, ip:port, or 'envfd:NAME' to listen on
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Directory packages are fetched into (default: $GOPATH/src)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Seconds a fetched package is served without fetching again
    #[arg(long)]
    pub freshness_secs: Option<u64>,

    /// Kill the retrieval command after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
