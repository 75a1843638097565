//! `[export]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[export]` section in conf.toml - static export settings.
///
/// # Example
/// ```toml
/// [export]
/// output = "public"
/// clean = false
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory the static tree is written to.
    #[serde(default = "defaults::export::output")]
    #[educe(Default = defaults::export::output())]
    pub output: PathBuf,

    /// Remove the output directory before exporting.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub clean: bool,
}
