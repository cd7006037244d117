//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::ProxyResult;

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> ProxyResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> ProxyResult<()> {
    let toml = toml::to_string_pretty(config)?;
    println!("{}", toml);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> ProxyResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        eprintln!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!("Configuration initialized at {}", path.display());
    Ok(())
}
