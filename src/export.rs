//! Static export.
//!
//! Renders every concrete route through [`Site::respond`] and writes the
//! result tree:
//!
//! ```text
//! public/
//! ├── index.html            ← /
//! ├── en/about/index.html   ← /en/about
//! ├── about/index.html      ← /about
//! ├── sitemap.xml
//! ├── 404.html              (when a not-found page is configured)
//! └── static/**             (copied verbatim)
//! ```
//!
//! A failing route is logged and counted; the walk always finishes.

use crate::{
    config::SiteConfig,
    log,
    logger::ProgressBar,
    render::error_chain,
    site::{SITEMAP_PATH, Site},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use walkdir::WalkDir;

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Outcome of one export run
#[derive(Debug, Default)]
pub struct ExportReport {
    pub pages: usize,
    pub static_files: usize,
    /// `(url, reason)` of every route that could not be written
    pub failed: Vec<(String, String)>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Export the whole site into `config.build.output`.
///
/// If `config.build.clean` is true, clears the output directory first.
pub fn export_site(site: &Site, config: &SiteConfig) -> Result<ExportReport> {
    let output = &config.build.output;
    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    let mut report = ExportReport {
        static_files: copy_static(site.static_dir(), &output.join("static"))?,
        ..Default::default()
    };

    let urls: Vec<String> = site
        .routes
        .concrete_urls()
        .into_iter()
        .filter(|url| url != SITEMAP_PATH)
        .collect();

    log!("export"; "rendering {} routes...", urls.len());
    let progress = ProgressBar::new("export", urls.len());
    let failed = Mutex::new(Vec::new());

    urls.par_iter().for_each(|url| {
        if let Err(reason) = export_route(site, url, output) {
            log!("error"; "{url}: {reason}");
            if let Ok(mut failed) = failed.lock() {
                failed.push((url.clone(), reason));
            }
        }
        progress.inc();
    });
    progress.finish();

    report.failed = failed.into_inner().unwrap_or_default();
    report.failed.sort();
    report.pages = progress.count() - report.failed.len();

    let sitemap = site.respond("GET", SITEMAP_PATH);
    write_file(&output.join("sitemap.xml"), &sitemap.body)?;

    if let Some(page) = site.render_not_found("/404.html") {
        match page {
            Ok(html) => write_file(&output.join("404.html"), html.as_bytes())?,
            Err(err) => {
                let reason = error_chain(&err);
                log!("error"; "404.html: {reason}");
                report.failed.push(("/404.html".to_owned(), reason));
            }
        }
    }

    if report.is_success() {
        log!("export"; "done: {} pages, {} static files", report.pages, report.static_files);
    } else {
        log!("warn"; "{} of {} routes failed", report.failed.len(), urls.len());
    }

    Ok(report)
}

/// Render one URL and write it to `<output>/<url>/index.html`.
fn export_route(site: &Site, url: &str, output: &Path) -> Result<(), String> {
    let reply = site.respond("GET", url);
    if !reply.is_success() {
        return Err(format!(
            "status {}: {}",
            reply.status,
            String::from_utf8_lossy(&reply.body)
        ));
    }
    let dest = page_path(output, url);
    write_file(&dest, &reply.body).map_err(|err| format!("{err:#}"))
}

/// `/en/about` → `<output>/en/about/index.html`, `/` → `<output>/index.html`
fn page_path(output: &Path, url: &str) -> PathBuf {
    let rel = url.trim_matches('/');
    if rel.is_empty() {
        output.join("index.html")
    } else {
        output.join(rel).join("index.html")
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Copy the static tree byte for byte, returning the number of files.
fn copy_static(source: &Path, dest: &Path) -> Result<usize> {
    if !source.is_dir() {
        log!("warn"; "static directory {} not found, skipping", source.display());
        return Ok(0);
    }

    let files = collect_all_files(source);
    files.par_iter().try_for_each(|path| -> Result<()> {
        let rel = path.strip_prefix(source)?;
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target)
            .with_context(|| format!("Failed to copy {}", path.display()))?;
        Ok(())
    })?;

    log!("static"; "copied {} files", files.len());
    Ok(files.len())
}

/// Collect all files from a directory recursively
fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.into_path())
        .collect()
}
