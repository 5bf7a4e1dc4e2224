//! sitegen - A multilingual static site generator and live server.

mod bundle;
mod cli;
mod config;
mod export;
mod generator;
mod logger;
mod manifest;
mod render;
mod routes;
mod serve;
mod site;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use export::export_site;
use serve::serve_site;
use site::Site;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    if config.config_path.exists() {
        log!("config"; "using {}", config.config_path.display());
    }

    let site = Site::load(&config)?;

    match &cli.command {
        Commands::Build { .. } => {
            let report = export_site(&site, &config)?;
            if !report.is_success() {
                bail!("{} routes failed to export", report.failed.len());
            }
            Ok(())
        }
        Commands::Serve { .. } => serve_site(Arc::new(site), &config),
    }
}
