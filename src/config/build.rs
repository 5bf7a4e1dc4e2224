//! `[build]` section configuration.
//!
//! Locations of the manifest, the shared layout, the dynamic content tree,
//! the static asset tree and the export output. All paths are relative to
//! the project root until `SiteConfig::update_with_cli` normalizes them.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in site.toml.
///
/// # Example
/// ```toml
/// [build]
/// manifest = "manifest.yaml"
/// layout = "templates/layouts/base.html"
/// output = "dist"
/// clean = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (set from the CLI, not from the file)
    #[serde(skip)]
    pub root: Option<PathBuf>,

    /// Route manifest
    #[serde(default = "defaults::build::manifest")]
    #[educe(Default = defaults::build::manifest())]
    pub manifest: PathBuf,

    /// Shared layout every page is composed into
    #[serde(default = "defaults::build::layout")]
    #[educe(Default = defaults::build::layout())]
    pub layout: PathBuf,

    /// Content tree globbed by dynamic routes
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: PathBuf,

    /// Served under `/static/` and mirrored into the output
    #[serde(default = "defaults::build::static_dir")]
    #[educe(Default = defaults::build::static_dir())]
    pub static_dir: PathBuf,

    /// Export destination
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Remove the output directory before exporting
    #[serde(default)]
    pub clean: bool,
}
