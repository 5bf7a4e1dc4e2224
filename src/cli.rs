//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sitegen - render a manifest-described site live or to static files
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (optional, default: site.toml)
    #[arg(short = 'C', long, default_value = "site.toml")]
    pub config: PathBuf,

    /// Manifest path, relative to root
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Override the manifest origin used for canonical URLs and the sitemap.
    ///
    /// Useful when the deployed URL differs per environment:
    ///   sitegen --origin "https://staging.example.com" build
    #[arg(long)]
    pub origin: Option<String>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render every route into the output directory
    Build {
        /// Output directory path (relative to root)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Remove the output directory before building
        #[arg(long)]
        clean: bool,
    },

    /// Serve the site, rendering each request from the current sources
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Number of request handler threads
        #[arg(short, long)]
        workers: Option<usize>,
    },
}
