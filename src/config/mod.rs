//! Site configuration management for `site.toml`.
//!
//! The file is optional: every field has a default, and CLI flags override
//! whatever the file sets. The route manifest itself lives in a separate
//! YAML document (see `crate::manifest`).
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `[build]`   | Manifest, layout, pages, static and output paths  |
//! | `[serve]`   | Live server (interface, port, workers)            |
//!
//! # Example
//!
//! ```toml
//! [build]
//! manifest = "manifest.yaml"
//! output = "dist"
//!
//! [serve]
//! port = 3000
//! ```

mod build;
pub mod defaults;
mod error;
mod serve;

pub use error::ConfigError;

use build::BuildConfig;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing site.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading, may not exist)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Origin override from the CLI, replaces `manifest.origin` when set
    #[serde(skip)]
    pub origin: Option<String>,

    /// Path settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Live server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let config = toml::from_str(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;
        Ok(config)
    }

    /// Load `site.toml` when present, fall back to defaults, then apply
    /// the CLI flags and validate.
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
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.manifest, cli.manifest.as_ref());
        if cli.origin.is_some() {
            self.origin = cli.origin.clone();
        }

        match &cli.command {
            Commands::Build { output, clean } => {
                Self::update_option(&mut self.build.output, output.as_ref());
                self.build.clean |= *clean;
            }
            Commands::Serve {
                interface,
                port,
                workers,
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.workers, workers.as_ref());
            }
        }

        self.update_path_with_root(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config_name: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config_name));
        self.build.manifest = Self::normalize_path(&root.join(&self.build.manifest));
        self.build.layout = Self::normalize_path(&root.join(&self.build.layout));
        self.build.pages = Self::normalize_path(&root.join(&self.build.pages));
        self.build.static_dir = Self::normalize_path(&root.join(&self.build.static_dir));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
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

    /// Validate the paths and overrides needed by every command
    pub fn validate(&self) -> Result<()> {
        if !self.build.manifest.is_file() {
            bail!(ConfigError::Validation(format!(
                "manifest not found: {}",
                self.build.manifest.display()
            )));
        }

        if let Some(origin) = &self.origin
            && !origin.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "--origin must start with http:// or https://".into()
            ));
        }

        if self.serve.workers == 0 {
            bail!(ConfigError::Validation("[serve.workers] must be at least 1".into()));
        }

        Ok(())
    }

    /// Build a config rooted at `root` with default paths, as `load` would
    /// for a project without site.toml.
    #[cfg(test)]
    pub fn for_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.update_path_with_root(root, Path::new("site.toml"));
        config
    }
}

// ============================================================================
// Tests
// ============================================================================
