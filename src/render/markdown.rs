//! Markdown sources: frontmatter split and HTML conversion.

use super::RenderError;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

/// Separator between frontmatter and body
const SEPARATOR: &str = "\n---\n";

/// Container every markdown page body is wrapped in
const ARTICLE_OPEN: &str = r#"<article class="flex flex-col gap-4 blog-container">"#;
const ARTICLE_CLOSE: &str = "</article>";

/// A markdown page split into its flat frontmatter and raw body.
#[derive(Debug)]
pub struct MarkdownPage<'a> {
    pub meta: BTreeMap<String, String>,
    pub body: &'a str,
}

impl<'a> MarkdownPage<'a> {
    /// The source must contain the separator exactly once.
    pub fn parse(content: &'a str, path: &Path) -> Result<Self, RenderError> {
        let mut parts = content.split(SEPARATOR);
        let (Some(frontmatter), Some(body), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(RenderError::MalformedSource(path.to_path_buf()));
        };

        let meta = if frontmatter.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_yaml::from_str(frontmatter)
                .map_err(|err| RenderError::Frontmatter(path.to_path_buf(), err))?
        };

        Ok(Self { meta, body })
    }

    pub fn title(&self) -> &str {
        self.meta.get("title").map_or("", String::as_str)
    }

    pub fn description(&self) -> &str {
        self.meta.get("description").map_or("", String::as_str)
    }
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// Convert markdown to HTML. Headings without an explicit `{#id}` get one
/// derived from their text.
pub fn to_html(source: &str) -> String {
    let mut events: Vec<Event> = Parser::new_ext(source, options()).collect();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }
        let text: String = events[i + 1..]
            .iter()
            .take_while(|event| !matches!(event, Event::End(TagEnd::Heading(_))))
            .filter_map(|event| match event {
                Event::Text(text) | Event::Code(text) => Some(&**text),
                _ => None,
            })
            .collect();

        let slug = unique_slug(&slugify(&text), &mut seen);
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
    }

    let mut output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut output, events.into_iter());
    output
}

/// Wrap a rendered markdown body in the page container.
pub fn wrap_article(body: &str) -> String {
    format!("\n  {ARTICLE_OPEN}\n  {body}\n  {ARTICLE_CLOSE}\n  ")
}

fn slugify(text: &str) -> String {
    let slug = slug::slugify(text);
    if slug.is_empty() {
        "section".to_owned()
    } else {
        slug
    }
}

fn unique_slug(slug: &str, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(slug.to_owned()).or_insert(0);
    let unique = if *count == 0 {
        slug.to_owned()
    } else {
        format!("{slug}-{count}")
    };
    *count += 1;
    unique
}
