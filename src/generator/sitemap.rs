//! Sitemap generation.
//!
//! Lists every registered route for search engine indexing. Localized
//! templates contribute one URL per language; the bare root is left out
//! since `/<lang>/` already covers it.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/en/about</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{
    log,
    routes::expand_template,
    site::{SITEMAP_PATH, Site},
};

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Public API
// ============================================================================

/// Sitemap XML for the site, stamped with today's date.
pub fn build_sitemap(site: &Site) -> String {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let sitemap = Sitemap::from_templates(site.routes.templates(), site.origin(), &today);
    log!("sitemap"; "{} urls", sitemap.urls.len());
    sitemap.into_xml()
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

/// Sitemap data structure
struct Sitemap {
    /// List of URL entries
    urls: Vec<UrlEntry>,
}

/// Single URL entry in the sitemap
struct UrlEntry {
    /// Full URL location
    loc: String,
    /// Last modification date (YYYY-MM-DD format)
    lastmod: String,
}

impl Sitemap {
    /// Build sitemap from route templates in registration order.
    fn from_templates(templates: &[String], origin: &str, lastmod: &str) -> Self {
        let urls = templates
            .iter()
            .flat_map(|template| expand_template(template))
            .filter(|path| !path.is_empty() && path != "/" && path != SITEMAP_PATH)
            .map(|path| UrlEntry {
                loc: format!("{origin}{path}"),
                lastmod: lastmod.to_owned(),
            })
            .collect();

        Self { urls }
    }

    /// Generate sitemap XML string.
    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://example.com";

    fn xml_for(templates: &[&str]) -> String {
        let templates: Vec<String> = templates.iter().map(|t| t.to_string()).collect();
        Sitemap::from_templates(&templates, ORIGIN, "2025-01-01").into_xml()
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("hello"), "hello");
        assert_eq!(escape_xml("<test>"), "&lt;test&gt;");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_xml("it's"), "it&apos;s");
    }

    #[test]
    fn test_sitemap_empty() {
        let xml = xml_for(&[]);

        assert!(xml.contains(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_localized_template_expands_per_language() {
        let xml = xml_for(&["/{lang:en|es}/about", "/about"]);

        assert!(xml.contains("<loc>https://example.com/en/about</loc>"));
        assert!(xml.contains("<loc>https://example.com/es/about</loc>"));
        assert!(xml.contains("<loc>https://example.com/about</loc>"));
        assert_eq!(xml.matches("<lastmod>2025-01-01</lastmod>").count(), 3);
    }

    #[test]
    fn test_bare_root_skipped() {
        let xml = xml_for(&["/{lang:en|es}/", "/"]);

        assert!(xml.contains("<loc>https://example.com/en/</loc>"));
        assert!(xml.contains("<loc>https://example.com/es/</loc>"));
        assert!(!xml.contains("<loc>https://example.com/</loc>"));
        assert_eq!(xml.matches("<url>").count(), 2);
    }

    #[test]
    fn test_instances_and_sitemap_route() {
        let xml = xml_for(&["/en/blog/hello", "/es/blog/hello", "/sitemap.xml"]);

        assert!(xml.contains("<loc>https://example.com/es/blog/hello</loc>"));
        assert!(!xml.contains("sitemap.xml"));
    }

    #[test]
    fn test_sitemap_escapes_special_chars() {
        let xml = xml_for(&["/search&sort"]);
        assert!(xml.contains("<loc>https://example.com/search&amp;sort</loc>"));
    }

    #[test]
    fn test_sitemap_xml_structure() {
        let xml = xml_for(&["/about"]);

        let lines: Vec<&str> = xml.lines().collect();
        assert_eq!(lines[0], r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        assert!(lines[1].starts_with("<urlset"));
        assert!(lines.last().unwrap().trim() == "</urlset>");
    }
}
