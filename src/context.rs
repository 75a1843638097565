//! Everything a page needs, bundled once per data snapshot.
//!
//! A [`SiteContext`] is never mutated. The server holds it behind an
//! `ArcSwap` and the watcher replaces it wholesale on reload.

use crate::{
    config::SiteConfig,
    data::SiteData,
    log,
    render::Renderer,
};
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug)]
pub struct SiteContext {
    config: SiteConfig,
    data: SiteData,
    renderer: Renderer,
}

impl SiteContext {
    /// Load data tables and templates named by `config`.
    pub fn load(config: SiteConfig) -> Result<Self> {
        let data_path = &config.site.data_path;
        let data = SiteData::load(data_path)
            .with_context(|| format!("failed to load site data from {}", data_path.display()))?;

        log!(
            "data";
            "{} files, {} papers, {} speakers, {} workshops",
            data.watch_list().len(),
            data.papers().len(),
            data.speakers().len(),
            data.workshops().len()
        );
        if data.papers().is_empty() {
            log!("data"; "no papers in {}, paper pages will be empty", data_path.display());
        }

        let renderer = Renderer::new(&config.site.templates).context("failed to load templates")?;
        Ok(Self::new(config, data, renderer))
    }

    pub fn new(config: SiteConfig, data: SiteData, renderer: Renderer) -> Self {
        Self {
            config,
            data,
            renderer,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn data(&self) -> &SiteData {
        &self.data
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Inputs whose change invalidates this context.
    ///
    /// Directories are watched recursively; paths that do not exist yet
    /// are left out.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        let site = &self.config.site;
        [
            &site.data_path,
            &site.readme,
            &site.templates,
            &self.config.config_path,
        ]
        .into_iter()
        .filter(|path| path.exists())
        .cloned()
        .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use std::path::Path;

    /// Context over a project laid out like `data::fixture::site_dir`.
    pub fn fixture_context(root: &Path) -> SiteContext {
        let mut config = SiteConfig::default();
        config.resolve_paths(root, Path::new("conf.toml"));
        SiteContext::load(config).unwrap()
    }
}
