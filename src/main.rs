//! Miniconf - render a conference site from flat data files.

mod cli;
mod config;
mod context;
mod data;
mod export;
mod logger;
mod render;
mod serve;
mod watch;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::{Mode, SiteConfig};
use context::SiteContext;
use export::export_site;
use serve::serve_site;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;
    let mode = config.mode();
    let site = SiteContext::load(config)?;

    match mode {
        Mode::Export => export_site(&site).map(|_| ()),
        Mode::Serve => serve_site(site),
    }
}
