//! Static export: every route rendered to a file.
//!
//! # Flow
//!
//! ```text
//! export_site()
//!     │
//!     ├── enumerate_routes()   collections, one page per UID, one
//!     │                        serve_<table>.json per table
//!     │
//!     ├── render (rayon)       all pages into memory; first error aborts
//!     │
//!     ├── write (rayon)        <output>/<route path>, via temp file + rename
//!     │
//!     └── copy                 static dir, favicon.ico
//! ```
//!
//! Pages come from the same [`render`] the server uses, so an exported file
//! matches the live response byte for byte.

use crate::{
    context::SiteContext,
    data::{Entity, SiteData},
    log,
    logger::Progress,
    render::{Page, Route, render},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Output of a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub pages: usize,
    pub assets: usize,
}

/// Every concrete route of the site for the given data snapshot.
pub fn enumerate_routes(data: &SiteData) -> Vec<Route> {
    let mut routes = Route::COLLECTIONS.to_vec();

    routes.extend(data.papers().iter().map(|p| Route::Poster(p.uid().to_string())));
    routes.extend(data.speakers().iter().map(|s| Route::Speaker(s.uid().to_string())));
    routes.extend(data.workshops().iter().map(|w| Route::Workshop(w.uid().to_string())));
    routes.extend(data.table_names().map(|name| Route::ServeTable(name.to_owned())));

    routes
}

/// Render the whole site into `[export] output`.
///
/// Nothing is written unless every page renders.
pub fn export_site(site: &SiteContext) -> Result<ExportSummary> {
    let config = site.config();
    let output = &config.export.output;

    let routes = enumerate_routes(site.data());
    log!("export"; "rendering {} pages...", routes.len());

    let progress = Progress::new("export", routes.len());
    let rendered: Result<Vec<(Route, Page)>> = routes
        .into_par_iter()
        .map(|route| {
            let page = render(site, &route).with_context(|| format!("failed to render {route}"))?;
            progress.inc();
            Ok((route, page))
        })
        .collect();
    progress.finish();
    let pages = rendered?;

    prepare_output(output, config.export.clean)?;

    pages
        .par_iter()
        .try_for_each(|(route, page)| write_atomic(&output.join(route.path()), &page.body))?;

    let mut assets = copy_dir(&config.site.static_dir, &output.join("static"))?;

    let favicon = config.site.data_path.join("favicon.ico");
    if favicon.is_file() {
        fs::copy(&favicon, output.join("favicon.ico"))
            .with_context(|| format!("failed to copy {}", favicon.display()))?;
        assets += 1;
    }

    log!("export"; "{} pages, {} assets -> {}", pages.len(), assets, output.display());

    Ok(ExportSummary {
        output: output.clone(),
        pages: pages.len(),
        assets,
    })
}

/// Create the output directory, emptying it first when `clean` is set.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("failed to clean {}", output.display()))?;
    }
    fs::create_dir_all(output).with_context(|| format!("failed to create {}", output.display()))
}

/// Write `bytes` to a hidden sibling, then rename it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .with_context(|| format!("no file name in {}", path.display()))?;
    let tmp = path.with_file_name(format!(".{}.tmp", name.to_string_lossy()));

    fs::write(&tmp, bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("failed to move into {}", path.display()))
}

/// Copy every file under `src` into `dst`, keeping relative paths.
///
/// A missing `src` copies nothing.
fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    if !src.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("failed to read {}", src.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry.path().strip_prefix(src)?;
        let dest = dst.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)
            .with_context(|| format!("failed to copy {}", entry.path().display()))?;
        copied += 1;
    }

    Ok(copied)
}
