//! Partial inclusion.
//!
//! A template includes a partial with `<%= partial("name") %>`. Inclusion is
//! textual and happens before template execution, so a partial sees the
//! same render context as the page including it.

use super::{RenderError, markdown, read_source};
use crate::manifest::{Manifest, Partial, Route, TemplateType};
use regex::Regex;
use std::{path::Path, sync::LazyLock};

/// Nesting deeper than this is an error
pub const MAX_PARTIAL_DEPTH: usize = 10;

static RE_PARTIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<%=\s*partial\("([^"]+)"\)\s*%>"#).unwrap());

/// Chain of partials currently being expanded, innermost last.
///
/// Each level borrows its parent, so leaving a partial pops it for free and
/// siblings never see each other (a diamond include is not a cycle).
#[derive(Debug, Clone, Copy)]
pub struct PartialScope<'a> {
    parent: Option<&'a PartialScope<'a>>,
    name: &'a str,
    depth: usize,
}

impl<'a> PartialScope<'a> {
    pub const fn root() -> Self {
        Self {
            parent: None,
            name: "",
            depth: 0,
        }
    }

    /// Number of partials open above this point
    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_open(&self, name: &str) -> bool {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if current.depth > 0 && current.name == name {
                return true;
            }
            scope = current.parent;
        }
        false
    }

    pub fn enter(&'a self, name: &'a str) -> PartialScope<'a> {
        PartialScope {
            parent: Some(self),
            name,
            depth: self.depth + 1,
        }
    }
}

/// Expands partial markers against one manifest.
pub struct PartialResolver<'a> {
    manifest: &'a Manifest,
    root: &'a Path,
    max_depth: usize,
}

impl<'a> PartialResolver<'a> {
    pub const fn new(manifest: &'a Manifest, root: &'a Path) -> Self {
        Self {
            manifest,
            root,
            max_depth: MAX_PARTIAL_DEPTH,
        }
    }

    /// Replace every marker in `body` with the fully expanded partial.
    ///
    /// Every name must be declared by `route`, including names met inside
    /// nested partials.
    pub fn resolve(
        &self,
        body: &str,
        route: &Route,
        scope: &PartialScope<'_>,
    ) -> Result<String, RenderError> {
        let mut output = String::with_capacity(body.len());
        let mut last = 0;

        for caps in RE_PARTIAL.captures_iter(body) {
            let (Some(marker), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();

            if scope.is_open(name) {
                return Err(RenderError::CircularPartial(name.to_owned()));
            }
            if !route.declares_partial(name) {
                return Err(RenderError::UndeclaredPartial {
                    partial: name.to_owned(),
                    route: route.path.clone(),
                });
            }
            let partial = self
                .manifest
                .partials
                .get(name)
                .ok_or_else(|| RenderError::MissingPartial(name.to_owned()))?;
            let content = self.load(partial)?;

            if scope.depth() >= self.max_depth {
                return Err(RenderError::DepthExceeded(self.max_depth));
            }
            let child = scope.enter(name);
            let expanded = self.resolve(&content, route, &child)?;

            output.push_str(&body[last..marker.start()]);
            output.push_str(&expanded);
            last = marker.end();
        }

        output.push_str(&body[last..]);
        Ok(output)
    }

    fn load(&self, partial: &Partial) -> Result<String, RenderError> {
        let content = read_source(&self.root.join(&partial.source))?;
        Ok(match partial.template_type {
            TemplateType::Structured => content,
            TemplateType::Markdown => markdown::to_html(&content),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        manifest: Manifest,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                manifest: Manifest::default(),
            }
        }

        fn partial(mut self, name: &str, content: &str) -> Self {
            self.partial_with_type(name, content, TemplateType::Structured);
            self
        }

        fn partial_with_type(&mut self, name: &str, content: &str, template_type: TemplateType) {
            let source = format!("partials/{name}.{}", template_type.extension());
            let path = self.dir.path().join(&source);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            self.manifest.partials.insert(
                name.to_owned(),
                Partial {
                    source: source.into(),
                    template_type,
                },
            );
        }

        fn resolve(&self, body: &str, route: &Route) -> Result<String, RenderError> {
            PartialResolver::new(&self.manifest, self.dir.path()).resolve(
                body,
                route,
                &PartialScope::root(),
            )
        }
    }

    fn route(deps: &[&str]) -> Route {
        Route {
            path: "/page".into(),
            source: "templates/page.html".into(),
            template_type: TemplateType::Structured,
            javascript_deps: vec![],
            partial_deps: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn marker(name: &str) -> String {
        format!(r#"<%= partial("{name}") %>"#)
    }

    #[test]
    fn test_resolve_simple() {
        let fixture = Fixture::new().partial("nav", "<nav>menu</nav>");
        let body = format!("<body>{}<main/></body>", marker("nav"));

        let resolved = fixture.resolve(&body, &route(&["nav"])).unwrap();
        assert_eq!(resolved, "<body><nav>menu</nav><main/></body>");
    }

    #[test]
    fn test_marker_whitespace_variants() {
        let fixture = Fixture::new().partial("nav", "N");
        let body = r#"<%=partial("nav")%>|<%=   partial("nav")   %>"#;

        let resolved = fixture.resolve(body, &route(&["nav"])).unwrap();
        assert_eq!(resolved, "N|N");
    }

    #[test]
    fn test_body_without_markers_is_unchanged() {
        let fixture = Fixture::new();
        let body = "<p>{{ text(key=\"title\") }}</p>";
        assert_eq!(fixture.resolve(body, &route(&[])).unwrap(), body);
    }

    #[test]
    fn test_nested_partials() {
        let fixture = Fixture::new()
            .partial("layout", &format!("[{}]", marker("nav")))
            .partial("nav", &format!("<nav>{}</nav>", marker("logo")))
            .partial("logo", "LOGO");

        let resolved = fixture
            .resolve(&marker("layout"), &route(&["layout", "nav", "logo"]))
            .unwrap();
        assert_eq!(resolved, "[<nav>LOGO</nav>]");
    }

    #[test]
    fn test_diamond_is_not_circular() {
        let fixture = Fixture::new()
            .partial("a", &format!("{}{}", marker("b"), marker("c")))
            .partial("b", &marker("shared"))
            .partial("c", &marker("shared"))
            .partial("shared", "S");

        let resolved = fixture
            .resolve(&marker("a"), &route(&["a", "b", "c", "shared"]))
            .unwrap();
        assert_eq!(resolved, "SS");
    }

    #[test]
    fn test_repeated_sibling_include() {
        let fixture = Fixture::new().partial("hr", "<hr>");
        let body = format!("{0}x{0}", marker("hr"));

        assert_eq!(fixture.resolve(&body, &route(&["hr"])).unwrap(), "<hr>x<hr>");
    }

    #[test]
    fn test_direct_self_include_is_circular() {
        let fixture = Fixture::new().partial("loop", &marker("loop"));

        let err = fixture.resolve(&marker("loop"), &route(&["loop"])).unwrap_err();
        assert!(matches!(err, RenderError::CircularPartial(ref name) if name == "loop"));
    }

    #[test]
    fn test_transitive_cycle_is_circular() {
        let fixture = Fixture::new()
            .partial("a", &marker("b"))
            .partial("b", &marker("a"));

        let err = fixture.resolve(&marker("a"), &route(&["a", "b"])).unwrap_err();
        assert!(matches!(err, RenderError::CircularPartial(ref name) if name == "a"));
    }

    /// Chain p0 -> p1 -> ... -> p{len-1}
    fn chain(len: usize) -> (Fixture, Vec<String>) {
        let mut fixture = Fixture::new();
        let names: Vec<String> = (0..len).map(|i| format!("p{i}")).collect();
        for (i, name) in names.iter().enumerate() {
            let content = match names.get(i + 1) {
                Some(next) => marker(next),
                None => "end".to_string(),
            };
            fixture.partial_with_type(name, &content, TemplateType::Structured);
        }
        (fixture, names)
    }

    #[test]
    fn test_depth_at_limit_succeeds() {
        let (fixture, names) = chain(MAX_PARTIAL_DEPTH);
        let deps: Vec<&str> = names.iter().map(String::as_str).collect();

        let resolved = fixture.resolve(&marker("p0"), &route(&deps)).unwrap();
        assert_eq!(resolved, "end");
    }

    #[test]
    fn test_depth_over_limit_fails() {
        let (fixture, names) = chain(MAX_PARTIAL_DEPTH + 1);
        let deps: Vec<&str> = names.iter().map(String::as_str).collect();

        let err = fixture.resolve(&marker("p0"), &route(&deps)).unwrap_err();
        assert!(matches!(err, RenderError::DepthExceeded(MAX_PARTIAL_DEPTH)));
    }

    #[test]
    fn test_undeclared_partial() {
        let fixture = Fixture::new().partial("nav", "N");

        let err = fixture.resolve(&marker("nav"), &route(&[])).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UndeclaredPartial { ref partial, ref route } if partial == "nav" && route == "/page"
        ));
    }

    #[test]
    fn test_undeclared_nested_partial() {
        let fixture = Fixture::new()
            .partial("nav", &marker("logo"))
            .partial("logo", "L");

        let err = fixture.resolve(&marker("nav"), &route(&["nav"])).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UndeclaredPartial { ref partial, .. } if partial == "logo"
        ));
    }

    #[test]
    fn test_declared_but_missing_partial() {
        let fixture = Fixture::new();

        let err = fixture.resolve(&marker("ghost"), &route(&["ghost"])).unwrap_err();
        assert!(matches!(err, RenderError::MissingPartial(ref name) if name == "ghost"));
    }

    #[test]
    fn test_unreadable_partial_source() {
        let mut fixture = Fixture::new();
        fixture.manifest.partials.insert(
            "nav".into(),
            Partial {
                source: "partials/absent.html".into(),
                template_type: TemplateType::Structured,
            },
        );

        let err = fixture.resolve(&marker("nav"), &route(&["nav"])).unwrap_err();
        assert!(matches!(err, RenderError::MissingSource(..)));
    }

    #[test]
    fn test_markdown_partial_becomes_html() {
        let mut fixture = Fixture::new();
        fixture.partial_with_type("note", "**bold** note", TemplateType::Markdown);

        let resolved = fixture
            .resolve(&format!("<div>{}</div>", marker("note")), &route(&["note"]))
            .unwrap();
        assert!(resolved.starts_with("<div><p><strong>bold</strong> note</p>"));
        assert!(resolved.ends_with("</div>"));
    }

    #[test]
    fn test_scope_tracking() {
        let root = PartialScope::root();
        assert_eq!(root.depth(), 0);
        assert!(!root.is_open(""));

        let nav = root.enter("nav");
        let logo = nav.enter("logo");
        assert_eq!(logo.depth(), 2);
        assert!(logo.is_open("nav"));
        assert!(logo.is_open("logo"));
        assert!(!nav.is_open("logo"));
    }
}
