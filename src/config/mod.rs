//! Site configuration management for `conf.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `[site]`    | Data directory, README, static files, build mode  |
//! | `[serve]`   | Live server (port, interface, debug, watch)       |
//! | `[export]`  | Static export output                              |
//!
//! Options are grouped by section, so the flat names of a single-section
//! layout live under a header: `data_path` (alias `site_data_path`) and
//! `build` under `[site]`, `port` and `debug` under `[serve]`. A top-level
//! `port = 5000` is rejected as an unknown key.
//!
//! # Example
//!
//! ```toml
//! [site]
//! data_path = "sitedata"
//! build = false
//!
//! [serve]
//! port = 5000
//! debug = true
//!
//! [export]
//! output = "build"
//! ```

pub mod defaults;
mod error;
mod export;
mod serve;
mod site;

pub use error::ConfigError;
pub use export::ExportConfig;
pub use serve::ServeConfig;
pub use site::SiteSection;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// What the process does after the data is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write every page to disk and exit.
    Export,
    /// Answer HTTP requests until interrupted.
    Serve,
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing conf.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root every relative path is resolved against
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Site inputs and run mode
    #[serde(default)]
    pub site: SiteSection,

    /// Live server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Static export settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load, apply CLI overrides, resolve paths and validate.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        if !config_path.exists() {
            bail!(ConfigError::NotFound(config_path));
        }

        let mut config = Self::from_path(&config_path)?;
        config.update_with_cli(cli);
        config.resolve_paths(root, &cli.config);
        config.validate()?;
        Ok(config)
    }

    /// Mode requested by the subcommand, falling back to `[site] build`.
    pub fn mode(&self) -> Mode {
        if self.site.build { Mode::Export } else { Mode::Serve }
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        match &cli.command {
            Some(Commands::Build { output, clean }) => {
                self.site.build = true;
                Self::update_option(&mut self.export.output, output.as_ref());
                Self::update_option(&mut self.export.clean, clean.as_ref());
            }
            Some(Commands::Serve {
                interface,
                port,
                debug,
                watch,
            }) => {
                self.site.build = false;
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.debug, debug.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
            None => {}
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make every configured path absolute, relative to `root`.
    pub fn resolve_paths(&mut self, root: &Path, config_file: &Path) {
        let root = Self::normalize_path(root);

        self.config_path = Self::normalize_path(&root.join(config_file));
        self.site.data_path = Self::normalize_path(&root.join(&self.site.data_path));
        self.site.readme = Self::normalize_path(&root.join(&self.site.readme));
        self.site.static_dir = Self::normalize_path(&root.join(&self.site.static_dir));
        self.site.templates = Self::normalize_path(&root.join(&self.site.templates));
        self.export.output = Self::normalize_path(&root.join(&self.export.output));
        self.root = root;
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the selected mode
    pub fn validate(&self) -> Result<()> {
        let data = &self.site.data_path;
        if !data.exists() {
            bail!(ConfigError::Validation(format!(
                "[site.data_path] `{}` not found",
                data.display()
            )));
        }
        if !data.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[site.data_path] `{}` is not a directory",
                data.display()
            )));
        }

        if self.mode() == Mode::Serve {
            if self.serve.port == 0 {
                bail!(ConfigError::Validation("[serve.port] must not be 0".into()));
            }
            if self.serve.interface.parse::<std::net::IpAddr>().is_err() {
                bail!(ConfigError::Validation(format!(
                    "[serve.interface] `{}` is not an IP address",
                    self.serve.interface
                )));
            }
        }

        if self.mode() == Mode::Export {
            self.validate_output()?;
        }

        Ok(())
    }

    /// The output directory may be wiped by `clean`, so it must not hold
    /// any project input, nor sit inside the data directory.
    fn validate_output(&self) -> Result<()> {
        let output = &self.export.output;

        if output.starts_with(&self.site.data_path) {
            bail!(ConfigError::Validation(
                "[export.output] must not be inside [site.data_path]".into()
            ));
        }
        if *output == self.root {
            bail!(ConfigError::Validation(
                "[export.output] must not be the project root".into()
            ));
        }

        let inputs = [
            ("[site.data_path]", &self.site.data_path),
            ("[site.static_dir]", &self.site.static_dir),
            ("[site.templates]", &self.site.templates),
            ("[site.readme]", &self.site.readme),
            ("config file", &self.config_path),
        ];
        if let Some((name, _)) = inputs.iter().find(|(_, path)| path.starts_with(output)) {
            bail!(ConfigError::Validation(format!(
                "[export.output] `{}` would contain {name}",
                output.display()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn project(conf: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sitedata")).unwrap();
        fs::write(dir.path().join("conf.toml"), conf).unwrap();
        dir
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str(
            r#"
            [site]
            data_path = "data"
            [serve]
            port = 8000
        "#,
        )
        .unwrap();

        assert_eq!(config.site.data_path, PathBuf::from("data"));
        assert_eq!(config.serve.port, 8000);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[site\ndata_path = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_flat_option_names_need_their_section() {
        assert!(SiteConfig::from_str("port = 5000\n").is_err());
        assert!(SiteConfig::from_str("site_data_path = \"data\"\n").is_err());

        let config = SiteConfig::from_str(
            r#"
            [site]
            site_data_path = "data"
            build = true
            [serve]
            port = 5000
            debug = true
        "#,
        )
        .unwrap();
        assert_eq!(config.site.data_path, PathBuf::from("data"));
        assert!(config.site.build);
        assert!(config.serve.debug);
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = SiteConfig::from_str(
            r#"
            [unknown_section]
            field = "value"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();

        assert_eq!(config.root, PathBuf::from("./"));
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.serve.port, 5000);
        assert_eq!(config.mode(), Mode::Serve);
    }

    #[test]
    fn test_load_resolves_paths() {
        let dir = project("[site]\nreadme = \"docs/README.md\"\n");
        let root = dir.path().to_str().unwrap();

        let config = SiteConfig::load(&cli(&["miniconf", "--root", root])).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.root, root);
        assert_eq!(config.config_path, root.join("conf.toml"));
        assert_eq!(config.site.data_path, root.join("sitedata"));
        assert_eq!(config.site.readme, root.join("docs/README.md"));
        assert_eq!(config.export.output, root.join("build"));
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();

        let err = SiteConfig::load(&cli(&["miniconf", "--root", root])).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("conf.toml"), "[site]\ndata_path = \"nope\"\n").unwrap();
        let root = dir.path().to_str().unwrap();

        let err = SiteConfig::load(&cli(&["miniconf", "--root", root])).unwrap_err();
        assert!(err.to_string().contains("[site.data_path]"));
    }

    #[test]
    fn test_subcommand_overrides_build_flag() {
        let dir = project("[site]\nbuild = true\n");
        let root = dir.path().to_str().unwrap();

        let config =
            SiteConfig::load(&cli(&["miniconf", "--root", root, "serve", "-p", "9000"])).unwrap();
        assert_eq!(config.mode(), Mode::Serve);
        assert_eq!(config.serve.port, 9000);

        let config = SiteConfig::load(&cli(&["miniconf", "--root", root])).unwrap();
        assert_eq!(config.mode(), Mode::Export);
    }

    #[test]
    fn test_build_output_override() {
        let dir = project("");
        let root = dir.path().to_str().unwrap();

        let config =
            SiteConfig::load(&cli(&["miniconf", "--root", root, "build", "-o", "public"]))
                .unwrap();

        assert_eq!(config.mode(), Mode::Export);
        assert_eq!(
            config.export.output,
            dir.path().canonicalize().unwrap().join("public")
        );
    }

    #[test]
    fn test_build_output_must_not_hold_inputs() {
        let dir = project("");
        fs::create_dir(dir.path().join("static")).unwrap();
        let root = dir.path().to_str().unwrap();

        for output in [".", "static", "sitedata/pages"] {
            let err = SiteConfig::load(&cli(&["miniconf", "--root", root, "build", "-o", output]))
                .unwrap_err();
            assert!(err.to_string().contains("[export.output]"), "{output}: {err}");
        }

        let err = SiteConfig::load(&cli(&["miniconf", "--root", root, "build", "-o", ".."]))
            .unwrap_err();
        assert!(err.to_string().contains("[export.output]"));
        assert!(dir.path().join("sitedata").is_dir());
        assert!(dir.path().join("conf.toml").is_file());
    }

    #[test]
    fn test_invalid_interface() {
        let dir = project("[serve]\ninterface = \"localhost\"\n");
        let root = dir.path().to_str().unwrap();

        let err = SiteConfig::load(&cli(&["miniconf", "--root", root])).unwrap_err();
        assert!(err.to_string().contains("[serve.interface]"));
    }
}
