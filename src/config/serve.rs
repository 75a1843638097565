//! `[serve]` section configuration.
//!
//! Contains development server settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in conf.toml - live server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 8080
/// debug = true           # error details in 500 responses
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 5000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Log every request and put the error chain into 500 responses.
    #[serde(default)]
    pub debug: bool,

    /// Reload data tables and templates when their files change.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_serve_config() {
        let config: SiteConfig = toml::from_str(
            r#"
            [serve]
            interface = "0.0.0.0"
            port = 8080
            debug = true
            watch = false
        "#,
        )
        .unwrap();

        assert_eq!(config.serve.interface, "0.0.0.0");
        assert_eq!(config.serve.port, 8080);
        assert!(config.serve.debug);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config: SiteConfig = toml::from_str(
            r#"
            [serve]
            port = 3000
        "#,
        )
        .unwrap();

        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.interface, "127.0.0.1");
        assert!(!config.serve.debug);
        assert!(config.serve.watch);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
            [serve]
            unknown_field = "should_fail"
        "#,
        );

        assert!(result.is_err());
    }
}
