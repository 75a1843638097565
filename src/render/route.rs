//! URL paths of the site, as a closed set of routes.
//!
//! A route's [`Route::path`] is both the URL (below `/`) and the file name it
//! is exported to, so parsing and formatting must agree.

use std::fmt;

/// Every page the site can render.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Help,
    Papers,
    PaperVis,
    Schedule,
    Workshops,
    Chat,
    Poster(String),
    Speaker(String),
    Workshop(String),
    PapersJson,
    ServeTable(String),
}

/// Whether a route renders HTML or a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Html,
    Json,
}

impl PageKind {
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

/// `(prefix, suffix)` of keyed routes.
const POSTER: (&str, &str) = ("poster_", ".html");
const SPEAKER: (&str, &str) = ("speaker_", ".html");
const WORKSHOP: (&str, &str) = ("workshop_", ".html");
const SERVE: (&str, &str) = ("serve_", ".json");

impl Route {
    /// Routes without a key.
    pub const COLLECTIONS: [Route; 8] = [
        Route::Home,
        Route::Help,
        Route::Papers,
        Route::PaperVis,
        Route::Schedule,
        Route::Workshops,
        Route::Chat,
        Route::PapersJson,
    ];

    /// Parse a request path (leading `/` optional).
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim_start_matches('/');

        let fixed = match path {
            "index.html" => Some(Self::Home),
            "help.html" => Some(Self::Help),
            "papers.html" => Some(Self::Papers),
            "paper_vis.html" => Some(Self::PaperVis),
            "calendar.html" => Some(Self::Schedule),
            "workshops.html" => Some(Self::Workshops),
            "chat.html" => Some(Self::Chat),
            "papers.json" => Some(Self::PapersJson),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        let keyed = |(prefix, suffix): (&str, &str)| {
            path.strip_prefix(prefix)?
                .strip_suffix(suffix)
                .filter(|key| !key.is_empty() && !key.contains('/'))
                .map(str::to_owned)
        };

        keyed(POSTER)
            .map(Self::Poster)
            .or_else(|| keyed(SPEAKER).map(Self::Speaker))
            .or_else(|| keyed(WORKSHOP).map(Self::Workshop))
            .or_else(|| keyed(SERVE).map(Self::ServeTable))
    }

    /// Path relative to the site root, e.g. `poster_p1.html`.
    pub fn path(&self) -> String {
        let keyed = |(prefix, suffix): (&str, &str), key: &str| format!("{prefix}{key}{suffix}");

        match self {
            Self::Home => "index.html".into(),
            Self::Help => "help.html".into(),
            Self::Papers => "papers.html".into(),
            Self::PaperVis => "paper_vis.html".into(),
            Self::Schedule => "calendar.html".into(),
            Self::Workshops => "workshops.html".into(),
            Self::Chat => "chat.html".into(),
            Self::PapersJson => "papers.json".into(),
            Self::Poster(uid) => keyed(POSTER, uid),
            Self::Speaker(uid) => keyed(SPEAKER, uid),
            Self::Workshop(uid) => keyed(WORKSHOP, uid),
            Self::ServeTable(name) => keyed(SERVE, name),
        }
    }

    pub const fn kind(&self) -> PageKind {
        match self {
            Self::PapersJson | Self::ServeTable(_) => PageKind::Json,
            _ => PageKind::Html,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}
