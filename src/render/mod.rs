//! Render pipeline.
//!
//! One render turns a matched route into an HTML document:
//!
//! ```text
//! page source ──► partials ──► tera / markdown ──► body
//!                                                   │
//! layout      ──► partials ──────────────► tera ◄───┘ (as `content`)
//! ```
//!
//! Everything is rebuilt per render (tera instance, context, partial scope)
//! and sources are read from disk each time, so edits show up on the next
//! request without a restart.

mod context;
mod error;
pub mod markdown;
pub mod partial;

pub use context::canonical_url;
pub use error::{RenderError, error_chain};

use crate::{
    bundle::AssetMap,
    manifest::{Manifest, Route, TemplateType, TranslationTable},
};
use markdown::MarkdownPage;
use partial::{PartialResolver, PartialScope};
use std::{collections::BTreeMap, fs, path::Path, sync::Arc};
use tera::{Context, Tera};

/// What to render: a route in one language for one request path.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub route: &'a Route,
    pub lang: &'a str,
    pub params: &'a BTreeMap<String, String>,
    /// Path as requested, used for `current_path` and `canonical`
    pub path: &'a str,
}

/// Borrowed view of the loaded site used to render pages.
pub struct Renderer<'a> {
    pub manifest: &'a Manifest,
    pub translations: &'a Arc<TranslationTable>,
    pub assets: &'a AssetMap,
    /// Path templates exposed as `registered_routes`
    pub templates: &'a [String],
    /// Project root, manifest sources are relative to it
    pub root: &'a Path,
    pub layout: &'a Path,
    pub origin: &'a str,
}

impl Renderer<'_> {
    pub fn render(&self, request: &RenderRequest<'_>) -> Result<String, RenderError> {
        let route = request.route;
        let mut context = self.context(request);
        let resolver = PartialResolver::new(self.manifest, self.root);
        let scope = PartialScope::root();

        let source_path = self.root.join(&route.source);
        let source = read_source(&source_path)?;

        let body = match route.template_type {
            TemplateType::Structured => {
                let resolved = resolver.resolve(&source, route, &scope)?;
                self.execute(&resolved, &context, request.lang)?
            }
            TemplateType::Markdown => {
                let page = MarkdownPage::parse(&source, &source_path)?;
                let resolved = resolver.resolve(page.body, route, &scope)?;
                context.insert("title", page.title());
                context.insert("description", page.description());
                context.insert("meta", &page.meta);
                markdown::wrap_article(&markdown::to_html(&resolved))
            }
        };

        let layout = read_source(self.layout)?;
        let layout = resolver.resolve(&layout, route, &scope)?;
        context.insert("content", &body);
        self.execute(&layout, &context, request.lang)
    }

    /// Render the configured not-found page at `path` in `lang`.
    ///
    /// The page may include any partial the manifest declares.
    pub fn render_not_found(&self, path: &str, lang: &str) -> Option<Result<String, RenderError>> {
        let source = self.manifest.not_found_page()?;
        let route = Route {
            path: path.to_owned(),
            source: source.to_path_buf(),
            template_type: TemplateType::from_extension(source),
            javascript_deps: self.manifest.javascript_targets.keys().cloned().collect(),
            partial_deps: self.manifest.partials.keys().cloned().collect(),
        };
        let params = BTreeMap::new();
        Some(self.render(&RenderRequest {
            route: &route,
            lang,
            params: &params,
            path,
        }))
    }

    fn context(&self, request: &RenderRequest<'_>) -> Context {
        let mut context = Context::new();
        context.insert("params", request.params);
        context.insert("registered_routes", self.templates);
        context.insert("lang", request.lang);
        context.insert("supported_langs", self.translations.languages());
        context.insert("origin", self.origin);
        context.insert("app_origin", self.origin);
        context.insert("current_path", request.path);
        context.insert(
            "canonical",
            &canonical_url(self.origin, request.lang, request.path),
        );

        let javascript: BTreeMap<&str, &str> = request
            .route
            .javascript_deps
            .iter()
            .filter_map(|dep| {
                self.assets
                    .get(dep)
                    .map(|asset| (dep.as_str(), asset.as_str()))
            })
            .collect();
        for (label, asset) in &javascript {
            context.insert(*label, asset);
        }
        context.insert("javascript", &javascript);

        context
    }

    fn execute(
        &self,
        template: &str,
        context: &Context,
        lang: &str,
    ) -> Result<String, RenderError> {
        let mut tera = Tera::default();
        context::register_helpers(&mut tera, Arc::clone(self.translations), lang);
        tera.render_str(template, context).map_err(RenderError::Template)
    }
}

pub(crate) fn read_source(path: &Path) -> Result<String, RenderError> {
    fs::read_to_string(path).map_err(|err| RenderError::MissingSource(path.to_path_buf(), err))
}
