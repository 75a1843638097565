//! `[site]` section configuration.
//!
//! Where the site's inputs live and which mode to run in.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[site]` section in conf.toml.
///
/// # Example
/// ```toml
/// [site]
/// data_path = "sitedata"
/// readme = "README.md"
/// build = true           # export once and exit
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Directory scanned for data tables (one file per table). The flat
    /// `site_data_path` name is accepted here, inside `[site]`.
    #[serde(default = "defaults::site::data_path", alias = "site_data_path")]
    #[educe(Default = defaults::site::data_path())]
    pub data_path: PathBuf,

    /// Markdown file shown on the home page.
    #[serde(default = "defaults::site::readme")]
    #[educe(Default = defaults::site::readme())]
    pub readme: PathBuf,

    /// Directory served under `/static/` and copied on export.
    #[serde(default = "defaults::site::static_dir")]
    #[educe(Default = defaults::site::static_dir())]
    pub static_dir: PathBuf,

    /// Template override directory. Missing directory means built-in templates only.
    #[serde(default = "defaults::site::templates")]
    #[educe(Default = defaults::site::templates())]
    pub templates: PathBuf,

    /// Run the static export and exit instead of serving.
    #[serde(default)]
    pub build: bool,
}
