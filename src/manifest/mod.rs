//! Route manifest (`manifest.yaml`).
//!
//! The manifest declares every route, partial, translation and JavaScript
//! target of the site. It is loaded once at startup and never mutated.
//!
//! ```yaml
//! origin: https://example.com
//! not_found_page_source: templates/404.html
//! routes:
//!   - path: /about
//!     source: templates/about.html
//!     template_type: STRUCTURED
//!     javascript_deps: [main]
//!     partial_deps: [nav]
//!   - path: /blog/:slug
//!     source: pages/blog/[slug]
//!     template_type: MARKDOWN
//!     partial_deps: [nav]
//! javascript:
//!   main: { source: src/main.js, out_dir: static/js }
//! translations:
//!   - { code: en, source: i18n/en.yaml, source_type: YAML }
//!   - { code: es, source: i18n/es.yaml, source_type: YAML }
//! partials:
//!   nav: { source: templates/partials/nav.html, template_type: STRUCTURED }
//! ```

pub mod translations;

pub use translations::TranslationTable;

use crate::config::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// `/:name` path segment
static RE_DYNAMIC_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/:\w+").unwrap());

/// `[name]` source placeholder
static RE_DYNAMIC_SOURCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\w+\]").unwrap());

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub routes: Vec<Route>,

    #[serde(default, rename = "javascript")]
    pub javascript_targets: BTreeMap<String, JavascriptTarget>,

    #[serde(default)]
    pub translations: Vec<Translation>,

    #[serde(default)]
    pub origin: String,

    /// Empty means the plain-text 404 response is used
    #[serde(default)]
    pub not_found_page_source: String,

    #[serde(default)]
    pub partials: BTreeMap<String, Partial>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub path: String,
    pub source: PathBuf,
    pub template_type: TemplateType,
    #[serde(default)]
    pub javascript_deps: Vec<String>,
    #[serde(default)]
    pub partial_deps: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemplateType {
    /// Executed by the template engine
    Structured,
    /// Frontmatter + markdown body
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Partial {
    pub source: PathBuf,
    pub template_type: TemplateType,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JavascriptTarget {
    pub source: PathBuf,
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Translation {
    pub code: String,
    pub source: PathBuf,
    pub source_type: SourceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    Yaml,
    Json,
    Toml,
}

// ============================================================================
// Manifest
// ============================================================================

impl Manifest {
    pub fn from_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|err| ConfigError::Yaml(path.to_path_buf(), err))
    }

    /// Read, parse and validate the manifest at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let manifest = Self::from_str(&content, path)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.translations.is_empty() {
            return Err(ConfigError::Validation(
                "[translations] must declare at least one language".into(),
            ));
        }

        let mut codes = HashSet::new();
        for translation in &self.translations {
            if translation.code.is_empty() || translation.code.contains(['/', '|']) {
                return Err(ConfigError::Validation(format!(
                    "invalid translation code `{}`",
                    translation.code
                )));
            }
            if !codes.insert(translation.code.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "translation `{}` declared twice",
                    translation.code
                )));
            }
        }

        if !self.origin.is_empty() && !self.origin.starts_with("http") {
            return Err(ConfigError::Validation(
                "[origin] must start with http:// or https://".into(),
            ));
        }

        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "route path `{}` must start with `/`",
                    route.path
                )));
            }
            if let Some(dep) = route
                .javascript_deps
                .iter()
                .find(|dep| !self.javascript_targets.contains_key(*dep))
            {
                return Err(ConfigError::Validation(format!(
                    "route `{}` depends on undeclared javascript target `{dep}`",
                    route.path
                )));
            }
        }

        Ok(())
    }

    /// Custom not-found page source, if one is configured.
    pub fn not_found_page(&self) -> Option<&Path> {
        (!self.not_found_page_source.is_empty()).then(|| Path::new(&self.not_found_page_source))
    }

    /// Origin with any trailing slash removed.
    pub fn origin(&self) -> &str {
        self.origin.trim_end_matches('/')
    }
}

// ============================================================================
// Route
// ============================================================================

impl Route {
    /// Path contains at least one `/:name` segment
    pub fn is_dynamic(&self) -> bool {
        RE_DYNAMIC_SEGMENT.is_match(&self.path)
    }

    /// Source contains a `[name]` placeholder resolved per instance
    pub fn has_dynamic_source(&self) -> bool {
        RE_DYNAMIC_SOURCE.is_match(&self.source.to_string_lossy())
    }

    /// Names of the dynamic segments, in path order
    pub fn param_names(&self) -> Vec<&str> {
        RE_DYNAMIC_SEGMENT
            .find_iter(&self.path)
            .map(|m| &m.as_str()[2..])
            .collect()
    }

    pub fn declares_partial(&self, name: &str) -> bool {
        self.partial_deps.iter().any(|dep| dep == name)
    }
}

impl TemplateType {
    /// Extension of per-language instance sources (`<dir>/<lang>.<ext>`)
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Structured => "html",
            Self::Markdown => "md",
        }
    }

    /// Template type implied by a source file extension
    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("md") => Self::Markdown,
            _ => Self::Structured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
origin: https://example.com/
not_found_page_source: templates/404.html
routes:
  - path: /about
    source: templates/about.html
    template_type: STRUCTURED
    javascript_deps: [main]
    partial_deps: [nav, footer]
  - path: /blog/:slug
    source: pages/blog/[slug]
    template_type: MARKDOWN
javascript:
  main:
    source: src/main.js
    out_dir: static/js
translations:
  - code: en
    source: i18n/en.yaml
    source_type: YAML
  - code: es
    source: i18n/es.json
    source_type: JSON
partials:
  nav:
    source: templates/partials/nav.html
    template_type: STRUCTURED
  footer:
    source: templates/partials/footer.md
    template_type: MARKDOWN
"#;

    fn parse(content: &str) -> Result<Manifest, ConfigError> {
        Manifest::from_str(content, Path::new("manifest.yaml"))
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse(MANIFEST).unwrap();
        manifest.validate().unwrap();

        assert_eq!(manifest.routes.len(), 2);
        assert_eq!(manifest.routes[0].template_type, TemplateType::Structured);
        assert_eq!(manifest.routes[1].template_type, TemplateType::Markdown);
        assert_eq!(manifest.routes[0].partial_deps, vec!["nav", "footer"]);
        assert!(manifest.routes[1].javascript_deps.is_empty());
        assert_eq!(
            manifest.javascript_targets["main"].out_dir,
            PathBuf::from("static/js")
        );
        assert_eq!(manifest.translations[1].source_type, SourceType::Json);
        assert_eq!(manifest.partials["footer"].template_type, TemplateType::Markdown);
        assert_eq!(manifest.origin(), "https://example.com");
        assert_eq!(manifest.not_found_page(), Some(Path::new("templates/404.html")));
    }

    #[test]
    fn test_unknown_template_type_rejected() {
        let content = MANIFEST.replace(
            "template_type: MARKDOWN\njavascript",
            "template_type: PUG\njavascript",
        );
        assert!(matches!(parse(&content), Err(ConfigError::Yaml(..))));
    }

    #[test]
    fn test_unknown_translation_source_type_rejected() {
        let content = MANIFEST.replace("source_type: JSON", "source_type: PO");
        assert!(matches!(parse(&content), Err(ConfigError::Yaml(..))));
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let content = format!("{MANIFEST}\nfeeds: []\n");
        assert!(parse(&content).is_err());
    }

    #[test]
    fn test_validate_requires_translation() {
        let manifest = parse("origin: https://example.com\n").unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("at least one language"));
    }

    #[test]
    fn test_validate_duplicate_language() {
        let content = MANIFEST.replace("code: es", "code: en");
        let err = parse(&content).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_validate_undeclared_javascript_target() {
        let content = MANIFEST.replace("javascript_deps: [main]", "javascript_deps: [admin]");
        let err = parse(&content).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("admin"));
    }

    #[test]
    fn test_validate_route_path() {
        let content = MANIFEST.replace("path: /about", "path: about");
        assert!(parse(&content).unwrap().validate().is_err());
    }

    #[test]
    fn test_empty_not_found_page() {
        let manifest = Manifest::default();
        assert!(manifest.not_found_page().is_none());
    }

    #[test]
    fn test_route_dynamic_detection() {
        let manifest = parse(MANIFEST).unwrap();
        let about = &manifest.routes[0];
        let blog = &manifest.routes[1];

        assert!(!about.is_dynamic());
        assert!(!about.has_dynamic_source());
        assert!(blog.is_dynamic());
        assert!(blog.has_dynamic_source());
        assert_eq!(blog.param_names(), vec!["slug"]);
        assert!(about.declares_partial("nav"));
        assert!(!about.declares_partial("header"));
    }

    #[test]
    fn test_param_names_multiple_segments() {
        let route = Route {
            path: "/archive/:year/:slug".into(),
            source: "templates/post.html".into(),
            template_type: TemplateType::Structured,
            javascript_deps: vec![],
            partial_deps: vec![],
        };
        assert_eq!(route.param_names(), vec!["year", "slug"]);
        assert!(!route.has_dynamic_source());
    }

    #[test]
    fn test_template_type_extension() {
        assert_eq!(TemplateType::Structured.extension(), "html");
        assert_eq!(TemplateType::Markdown.extension(), "md");
        assert_eq!(
            TemplateType::from_extension(Path::new("templates/404.md")),
            TemplateType::Markdown
        );
        assert_eq!(
            TemplateType::from_extension(Path::new("templates/404.html")),
            TemplateType::Structured
        );
    }
}
