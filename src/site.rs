//! The loaded site and its HTTP surface.
//!
//! A [`Site`] is built once at startup and is read-only afterwards. Both the
//! live server and the exporter answer requests through [`Site::respond`],
//! so an exported page is byte for byte what the server would send.

use crate::{
    bundle::{AssetMap, Bundler, HashBundler},
    config::SiteConfig,
    generator::sitemap::build_sitemap,
    log,
    manifest::{Manifest, TranslationTable},
    render::{RenderError, RenderRequest, Renderer, error_chain},
    routes::RouteTable,
};
use anyhow::{Context, Result};
use std::{
    borrow::Cow,
    fs,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

pub const SITEMAP_PATH: &str = "/sitemap.xml";
const STATIC_PREFIX: &str = "/static/";

/// A complete HTTP answer, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body: body.into_bytes(),
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into().into_bytes(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Debug)]
pub struct Site {
    pub manifest: Manifest,
    pub translations: Arc<TranslationTable>,
    pub assets: AssetMap,
    pub routes: RouteTable,
    root: PathBuf,
    layout: PathBuf,
    static_dir: PathBuf,
    origin: String,
}

impl Site {
    /// Load manifest and translations, bundle JavaScript, expand routes.
    pub fn load(config: &SiteConfig) -> Result<Self> {
        let bundler = HashBundler::new(config.get_root());
        Self::load_with(config, &bundler)
    }

    pub fn load_with(config: &SiteConfig, bundler: &dyn Bundler) -> Result<Self> {
        let root = config.get_root().to_path_buf();
        let manifest = Manifest::from_path(&config.build.manifest)?;
        let translations = TranslationTable::load(&manifest.translations, &root)?;
        let assets = bundler
            .bundle(&manifest.javascript_targets)
            .context("Failed to bundle javascript")?;
        let routes = RouteTable::expand(
            &manifest.routes,
            translations.languages(),
            &config.build.pages,
        )?;

        let origin = config
            .origin
            .as_deref()
            .unwrap_or_else(|| manifest.origin())
            .trim_end_matches('/')
            .to_owned();

        log!(
            "site";
            "{} routes, {} languages, {} partials",
            routes.registrations().len(),
            translations.languages().len(),
            manifest.partials.len()
        );

        Ok(Self {
            manifest,
            translations: Arc::new(translations),
            assets,
            routes,
            root,
            layout: config.build.layout.clone(),
            static_dir: config.build.static_dir.clone(),
            origin,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Language used for requests without a language prefix
    pub fn default_language(&self) -> &str {
        self.translations.default_language().unwrap_or_default()
    }

    pub fn renderer(&self) -> Renderer<'_> {
        Renderer {
            manifest: &self.manifest,
            translations: &self.translations,
            assets: &self.assets,
            templates: self.routes.templates(),
            root: &self.root,
            layout: &self.layout,
            origin: &self.origin,
        }
    }

    /// Answer one request.
    ///
    /// Resolution order:
    /// 1. Non-GET → 405
    /// 2. `/sitemap.xml`
    /// 3. `/static/*` from the static directory
    /// 4. Registered route → rendered page (500 on render error)
    /// 5. Not-found page → 404
    pub fn respond(&self, method: &str, url: &str) -> Reply {
        if !method.eq_ignore_ascii_case("GET") {
            return Reply::text(405, "405 Method Not Allowed");
        }

        // Decode URL-encoded characters and strip the query string
        let decoded = urlencoding::decode(url).unwrap_or(Cow::Borrowed(url));
        let path = decoded.split(['?', '#']).next().unwrap_or_default();

        if path == SITEMAP_PATH {
            return Reply {
                status: 200,
                content_type: "application/xml; charset=utf-8",
                body: build_sitemap(self).into_bytes(),
            };
        }

        if let Some(rel) = path.strip_prefix(STATIC_PREFIX) {
            return self.serve_static(rel);
        }

        match self.routes.resolve(path) {
            Some(matched) => {
                let request = RenderRequest {
                    route: &matched.registration.route,
                    lang: matched.lang,
                    params: &matched.params,
                    path,
                };
                match self.renderer().render(&request) {
                    Ok(html) => Reply::html(200, html),
                    Err(err) => render_failed(path, &err),
                }
            }
            None => self.not_found(path),
        }
    }

    /// Render the custom not-found page, if one is configured.
    pub fn render_not_found(&self, path: &str) -> Option<Result<String, RenderError>> {
        self.renderer().render_not_found(path, self.default_language())
    }

    fn not_found(&self, path: &str) -> Reply {
        match self.render_not_found(path) {
            Some(Ok(html)) => Reply::html(404, html),
            Some(Err(err)) => render_failed(path, &err),
            None => Reply::text(404, "404 Not Found"),
        }
    }

    fn serve_static(&self, rel: &str) -> Reply {
        let Some(file) = static_file(&self.static_dir, rel) else {
            return Reply::text(403, "403 Forbidden");
        };
        if !file.is_file() {
            return self.not_found(&format!("{STATIC_PREFIX}{rel}"));
        }
        match fs::read(&file) {
            Ok(body) => Reply {
                status: 200,
                content_type: guess_content_type(&file),
                body,
            },
            Err(err) => {
                log!("static"; "cannot read {}: {err}", file.display());
                Reply::text(500, "500 Internal Server Error")
            }
        }
    }
}

fn render_failed(path: &str, err: &RenderError) -> Reply {
    let message = error_chain(err);
    log!("error"; "{path}: {message}");
    Reply::text(500, message)
}

/// Join `rel` under `dir`, rejecting anything that could escape it.
fn static_file(dir: &Path, rel: &str) -> Option<PathBuf> {
    let rel = Path::new(rel);
    rel.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| dir.join(rel))
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
pub fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("map" | "json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        _ => "application/octet-stream",
    }
}
