//! Page rendering error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no {table} record with UID `{uid}`")]
    NotFound { table: &'static str, uid: String },

    #[error("no data table named `{0}`")]
    UnknownTable(String),

    #[error("failed to render template `{name}`")]
    Template {
        name: &'static str,
        #[source]
        source: tera::Error,
    },

    #[error("failed to load templates")]
    Templates(#[from] tera::Error),

    #[error("failed to serialize JSON")]
    Json(#[from] serde_json::Error),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl RenderError {
    /// Errors that mean "this URL names nothing", as opposed to a broken page.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnknownTable(_))
    }
}
