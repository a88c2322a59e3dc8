//! Site configuration management for `lander.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[build]`   | Entry files, output dir, static asset lists      |
//! | `[cache]`   | Cache version, precache manifest, strategies     |
//! | `[serve]`   | Preview server (port, interface, contact path)   |
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "dist"
//! entry_html = "index.html"
//! entry_css = "css/styles.css"
//!
//! [cache]
//! version = "v1.2.0"
//! precache = ["./index.html", "./css/styles.css"]
//!
//! [serve]
//! port = 5277
//! ```

mod build;
mod cache;
pub mod defaults;
mod error;
mod serve;

pub use build::BuildConfig;
pub use cache::CacheConfig;
pub use error::ConfigError;
pub use serve::ServeConfig;

use crate::{
    cli::{Cli, Commands},
    compiler::normalize,
};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing lander.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root, resolved from CLI `--root` (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Runtime cache controller settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Preview server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load config for the given CLI invocation.
    ///
    /// A missing config file is not an error: every field has a default
    /// matching the conventional landing-site layout.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Absolute output directory
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.build.output)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
        let root = Self::normalize_path(&root);

        self.config_path = root.join(&cli.config);
        self.root = root;

        Self::update_option(&mut self.build.output, cli.output.as_ref());

        match &cli.command {
            Commands::Build { minify } => {
                Self::update_option(&mut self.build.minify, minify.as_ref());
            }
            Commands::Serve { interface, port } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::Check => {}
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
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

    /// Whether `output_dir()` is `root` itself or an ancestor of it.
    fn output_contains_root(&self) -> Result<bool> {
        let root = if self.root.is_absolute() {
            self.root.clone()
        } else {
            std::env::current_dir()?.join(&self.root)
        };
        let root = normalize(&root);
        let output = normalize(&root.join(&self.build.output));
        Ok(root.starts_with(&output))
    }

    /// Validate configuration values that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.build.max_passes == 0 {
            bail!(ConfigError::Validation(
                "[build.max_passes] must be greater than 0".into()
            ));
        }

        if self.build.output.as_os_str().is_empty() {
            bail!(ConfigError::Validation("[build.output] must not be empty".into()));
        }

        // The output directory is wiped on every build
        if self.output_contains_root()? {
            bail!(ConfigError::Validation(format!(
                "[build.output] `{}` must not be the project root or one of its parents",
                self.build.output.display()
            )));
        }

        if self.cache.version.trim().is_empty() {
            bail!(ConfigError::Validation("[cache.version] must not be empty".into()));
        }

        if !self.cache.revalidate_prefix.starts_with('/') {
            bail!(ConfigError::Validation(
                "[cache.revalidate_prefix] must start with `/`".into()
            ));
        }

        if url::Url::parse(&self.cache.scope).is_err() {
            bail!(ConfigError::Validation(
                "[cache.scope] must be an absolute URL".into()
            ));
        }

        if !self.serve.contact_endpoint.starts_with('/') {
            bail!(ConfigError::Validation(
                "[serve.contact_endpoint] must start with `/`".into()
            ));
        }

        Ok(())
    }
}
