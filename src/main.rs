//! Lingon - an in-place content engine for editable static sites.

mod backup;
mod cli;
mod config;
mod i18n;
mod logger;
mod render;
mod resolve;
mod serve;
mod template;
mod translate;
mod utils;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use serve::serve_site;
use std::path::Path;
use translate::translate_site;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::Serve { .. } => serve_site(config),
        Commands::Translate { pathname } => translate_site(config, pathname.as_deref()),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);

    if !config.config_path.exists() {
        bail!("Config file not found.");
    }
    config.validate()?;

    Ok(config)
}
