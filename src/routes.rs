//! Route expansion.
//!
//! Every manifest route becomes one or more registrations:
//!
//! | Route           | Registrations                                        |
//! |-----------------|------------------------------------------------------|
//! | `/about`        | `/{lang:en\|es}/about` and bare `/about`             |
//! | `/blog/:slug`   | `/<lang>/blog/<slug>` per discovered instance × lang |
//!
//! Dynamic instances are discovered by globbing the pages directory: each
//! `:name` segment becomes a `*` and every matching directory is one
//! instance.

use crate::{log, manifest::Route};
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf},
    sync::LazyLock,
};
use thiserror::Error;
use wax::Glob;

/// `:name` in a route path
static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":(\w+)").unwrap());

/// `/{lang:en|es}` prefix of a localized template
static RE_LANG_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\{lang:([^}]+)\}(.*)$").unwrap());

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route `{route}`: invalid glob `{pattern}`: {message}")]
    Glob {
        route: String,
        pattern: String,
        message: String,
    },

    #[error("route `{route}`: cannot walk pages directory: {message}")]
    Walk { route: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// Served under every language prefix
    Localized { path: String },
    /// Served without prefix, in the default language
    Bare { path: String },
    /// One dynamic instance in one language
    Instance { lang: String, path: String },
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub pattern: RoutePattern,
    /// Route with its source resolved for this registration
    pub route: Route,
    pub params: BTreeMap<String, String>,
}

/// A request path matched to its registration
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub registration: &'a Registration,
    pub lang: &'a str,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    registration: usize,
    /// Index into `languages`
    lang: usize,
}

#[derive(Debug, Default)]
pub struct RouteTable {
    registrations: Vec<Registration>,
    templates: Vec<String>,
    languages: Vec<String>,
    index: HashMap<String, IndexEntry>,
}

impl RouteTable {
    /// Expand `routes` for `languages` (default language first).
    pub fn expand(
        routes: &[Route],
        languages: &[String],
        pages_dir: &Path,
    ) -> Result<Self, RouteError> {
        let mut table = Self {
            languages: languages.to_vec(),
            ..Default::default()
        };

        for route in routes {
            if route.is_dynamic() {
                let instances = discover_instances(route, pages_dir)?;
                if instances.is_empty() {
                    log!("warn"; "route {} matched no directories under {}", route.path, pages_dir.display());
                }
                for instance in instances {
                    for lang in languages {
                        table.register_instance(route, &instance, lang);
                    }
                }
            } else {
                table.register(
                    RoutePattern::Localized {
                        path: route.path.clone(),
                    },
                    route.clone(),
                    BTreeMap::new(),
                );
                table.register(
                    RoutePattern::Bare {
                        path: route.path.clone(),
                    },
                    route.clone(),
                    BTreeMap::new(),
                );
            }
        }

        Ok(table)
    }

    fn register_instance(&mut self, route: &Route, instance: &Instance, lang: &str) {
        let source = if route.has_dynamic_source() {
            instance
                .dir
                .join(format!("{lang}.{}", route.template_type.extension()))
        } else {
            route.source.clone()
        };
        let concrete = Route {
            path: instance.path.clone(),
            source,
            ..route.clone()
        };
        self.register(
            RoutePattern::Instance {
                lang: lang.to_owned(),
                path: instance.path.clone(),
            },
            concrete,
            instance.params.clone(),
        );
    }

    fn register(&mut self, pattern: RoutePattern, route: Route, params: BTreeMap<String, String>) {
        let registration = self.registrations.len();
        let default_lang = 0;

        let urls: Vec<(String, usize)> = match &pattern {
            RoutePattern::Localized { path } => (0..self.languages.len())
                .map(|i| (prefixed(&self.languages[i], path), i))
                .collect(),
            RoutePattern::Bare { path } => vec![(path.clone(), default_lang)],
            RoutePattern::Instance { lang, path } => {
                let i = self
                    .languages
                    .iter()
                    .position(|l| l == lang)
                    .unwrap_or(default_lang);
                vec![(prefixed(lang, path), i)]
            }
        };
        for (url, lang) in urls {
            self.index
                .entry(index_key(&url))
                .or_insert(IndexEntry { registration, lang });
        }

        self.templates.push(self.template(&pattern));
        self.registrations.push(Registration {
            pattern,
            route,
            params,
        });
    }

    fn template(&self, pattern: &RoutePattern) -> String {
        match pattern {
            RoutePattern::Localized { path } => {
                format!("/{{lang:{}}}{path}", self.languages.join("|"))
            }
            RoutePattern::Bare { path } => path.clone(),
            RoutePattern::Instance { lang, path } => prefixed(lang, path),
        }
    }

    /// Find the registration serving `url_path`.
    pub fn resolve(&self, url_path: &str) -> Option<RouteMatch<'_>> {
        let entry = self.index.get(&index_key(url_path))?;
        let registration = &self.registrations[entry.registration];
        let lang = self.languages.get(entry.lang).map_or("", String::as_str);

        let mut params = registration.params.clone();
        if !matches!(registration.pattern, RoutePattern::Bare { .. }) {
            params.insert("lang".to_owned(), lang.to_owned());
        }

        Some(RouteMatch {
            registration,
            lang,
            params,
        })
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Path templates in registration order
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Every URL the table serves, each once, in registration order.
    pub fn concrete_urls(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.templates
            .iter()
            .flat_map(|template| expand_template(template))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

/// Concrete URLs of one path template.
///
/// `/{lang:en|es}/about` expands to `/en/about` and `/es/about`; any other
/// template is already concrete.
pub fn expand_template(template: &str) -> Vec<String> {
    match RE_LANG_TEMPLATE.captures(template) {
        Some(caps) => {
            let path = caps.get(2).map_or("", |m| m.as_str());
            caps.get(1)
                .map_or("", |m| m.as_str())
                .split('|')
                .map(|lang| prefixed(lang, path))
                .collect()
        }
        None => vec![template.to_owned()],
    }
}

/// `/<lang><path>`, where the root path becomes `/<lang>/`
fn prefixed(lang: &str, path: &str) -> String {
    if path.is_empty() || path == "/" {
        format!("/{lang}/")
    } else {
        format!("/{lang}{path}")
    }
}

/// Lookup key: leading slash present, trailing slash dropped
fn index_key(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

// ============================================================================
// Dynamic instance discovery
// ============================================================================

#[derive(Debug)]
struct Instance {
    /// Concrete path without language prefix
    path: String,
    dir: PathBuf,
    params: BTreeMap<String, String>,
}

fn discover_instances(route: &Route, pages_dir: &Path) -> Result<Vec<Instance>, RouteError> {
    let pattern = RE_PARAM.replace_all(&route.path, "*");
    let pattern = pattern.trim_start_matches('/');
    let names = route.param_names();

    if !pages_dir.is_dir() {
        return Ok(Vec::new());
    }

    let glob = Glob::new(pattern).map_err(|err| RouteError::Glob {
        route: route.path.clone(),
        pattern: pattern.to_owned(),
        message: err.to_string(),
    })?;

    let mut instances = Vec::new();
    for entry in glob.walk(pages_dir) {
        let entry = entry.map_err(|err| RouteError::Walk {
            route: route.path.clone(),
            message: err.to_string(),
        })?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        if dir.file_name().is_none_or(|name| name.is_empty()) {
            continue;
        }

        let matched = entry.matched();
        let params: BTreeMap<String, String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = matched.get(i + 1).unwrap_or_default();
                ((*name).to_owned(), value.to_owned())
            })
            .collect();
        if params.values().any(String::is_empty) {
            continue;
        }

        instances.push(Instance {
            path: concrete_path(&route.path, &params),
            dir: dir.to_path_buf(),
            params,
        });
    }

    instances.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(instances)
}

/// Substitute `:name` segments with their values
fn concrete_path(path: &str, params: &BTreeMap<String, String>) -> String {
    RE_PARAM
        .replace_all(path, |caps: &regex::Captures| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            params.get(name).cloned().unwrap_or_default()
        })
        .into_owned()
}
