//! Page rendering: routes, templates and the handlers behind them.
//!
//! # Architecture
//!
//! ```text
//!  URL path ──► Route::parse ──► pages::render(&SiteContext, &Route)
//!                                      │
//!                    ┌─────────────────┼──────────────────┐
//!                    ▼                 ▼                  ▼
//!              collection page     item page         data endpoint
//!              (whole tables)      (UID lookup)      (JSON document)
//!                    │                 │                  │
//!                    └──── Renderer (tera) ───┘           │
//!                                      ▼                  ▼
//!                                    Page { kind, body: Vec<u8> }
//! ```
//!
//! The live server and the static exporter both go through
//! [`pages::render`], so a page is the same bytes whichever way it is reached.

mod error;
pub mod pages;
pub mod route;

pub use error::RenderError;
pub use pages::render;
pub use route::{PageKind, Route};

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tera::{Context, Tera, Value};
use walkdir::WalkDir;

/// Templates compiled into the binary, by template name.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../embed/templates/base.html")),
    ("index.html", include_str!("../embed/templates/index.html")),
    ("help.html", include_str!("../embed/templates/help.html")),
    ("papers.html", include_str!("../embed/templates/papers.html")),
    ("papers_vis.html", include_str!("../embed/templates/papers_vis.html")),
    ("schedule.html", include_str!("../embed/templates/schedule.html")),
    ("workshops.html", include_str!("../embed/templates/workshops.html")),
    ("poster.html", include_str!("../embed/templates/poster.html")),
    ("speaker.html", include_str!("../embed/templates/speaker.html")),
    ("workshop.html", include_str!("../embed/templates/workshop.html")),
    ("chat.html", include_str!("../embed/templates/chat.html")),
];

/// A rendered page, ready to be sent or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub kind: PageKind,
    pub body: Vec<u8>,
}

/// Template engine holding the built-in templates plus any overrides.
#[derive(Debug)]
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Load built-in templates, then every `*.html` under `override_dir`
    /// (if it exists), replacing built-ins with the same relative name.
    pub fn new(override_dir: &Path) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.register_filter("markdown", markdown_filter);
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())?;

        let overrides = template_files(override_dir);
        if !overrides.is_empty() {
            tera.add_template_files(
                overrides
                    .iter()
                    .map(|(path, name)| (path.as_path(), Some(name.as_str()))),
            )?;
        }

        Ok(Self { tera })
    }

    pub fn render(&self, name: &'static str, context: &Context) -> Result<String, RenderError> {
        self.tera
            .render(name, context)
            .map_err(|source| RenderError::Template { name, source })
    }
}

/// `(path, template name)` for every `*.html` file below `dir`.
fn template_files(dir: &Path) -> Vec<(PathBuf, String)> {
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
        .filter_map(|e| {
            let rel = e.path().strip_prefix(dir).ok()?;
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some((e.path().to_path_buf(), name))
        })
        .collect()
}

/// `{{ text | markdown | safe }}`: CommonMark with tables and footnotes to HTML.
fn markdown_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    use pulldown_cmark::{Options, Parser, html};

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS;

    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Filter `markdown` expects a string"))?;

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(text, options));
    Ok(Value::String(out))
}
