//! HTML-parsing link extractor
//!
//! Parses the document with scraper and reads references from element
//! attributes, so text in comments and attribute-like strings in scripts are
//! ignored.

use crate::links::pattern::css_urls;
use crate::links::{LinkCollector, LinkExtractor};
use scraper::{Html, Selector};
use url::Url;

/// Attributes whose values are URL references
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action"];

/// Parser-based extractor
///
/// # Extraction Rules
///
/// **Include:**
/// - `href`, `src` and `action` attributes on any element
/// - `url(...)` references in `<style>` blocks and `style` attributes
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` references
/// - fragment-only references
/// - anything that does not resolve to an absolute HTTP(S) URL
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, html: &str, base_url: &Url) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut collector = LinkCollector::default();

        let Ok(all) = Selector::parse("*") else {
            return Vec::new();
        };

        for element in document.select(&all) {
            let value = element.value();

            for attribute in URL_ATTRIBUTES {
                if let Some(raw) = value.attr(attribute) {
                    collector.push(raw, base_url);
                }
            }

            if let Some(style) = value.attr("style") {
                for raw in css_urls(style) {
                    collector.push(raw, base_url);
                }
            }

            if value.name() == "style" {
                let css = element.text().collect::<String>();
                for raw in css_urls(&css) {
                    collector.push(raw, base_url);
                }
            }
        }

        collector.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn extract(html: &str) -> Vec<String> {
        HtmlLinkExtractor::new().extract_links(html, &base_url())
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        assert_eq!(extract(html), vec!["https://other.com/page"]);
    }

    #[test]
    fn test_extract_relative_link() {
        let html = r#"<html><body><a href="/other">Link</a></body></html>"#;
        assert_eq!(extract(html), vec!["https://example.com/other"]);
    }

    #[test]
    fn test_extract_resources_in_document_order() {
        let html = r#"
            <html>
            <head>
                <link rel="stylesheet" href="/site.css">
                <script src="/app.js"></script>
            </head>
            <body>
                <img src="/logo.png">
                <form action="/search"></form>
                <a href="/games">Games</a>
            </body>
            </html>
        "#;
        assert_eq!(
            extract(html),
            vec![
                "https://example.com/site.css",
                "https://example.com/app.js",
                "https://example.com/logo.png",
                "https://example.com/search",
                "https://example.com/games",
            ]
        );
    }

    #[test]
    fn test_extract_style_urls() {
        let html = r#"
            <html>
            <head><style>body { background: url('/bg.jpg'); }</style></head>
            <body><div style="background-image: url(/tile.png)"></div></body>
            </html>
        "#;
        assert_eq!(
            extract(html),
            vec!["https://example.com/bg.jpg", "https://example.com/tile.png"]
        );
    }

    #[test]
    fn test_decodes_entities() {
        let html = r#"<a href="/play?game=snake&amp;level=2">play</a>"#;
        assert_eq!(
            extract(html),
            vec!["https://example.com/play?game=snake&level=2"]
        );
    }

    #[test]
    fn test_ignores_commented_markup() {
        let html = r#"<!-- <a href="/hidden">hidden</a> --><a href="/shown">shown</a>"#;
        assert_eq!(extract(html), vec!["https://example.com/shown"]);
    }

    #[test]
    fn test_mixed_valid_and_invalid_links() {
        let html = r#"
            <html>
            <body>
                <a href="/valid">Valid</a>
                <a href="javascript:alert('no')">Invalid</a>
                <a href="mailto:test@example.com">Invalid</a>
                <a href="/another-valid">Valid</a>
                <a href="/valid#again">Duplicate</a>
            </body>
            </html>
        "#;
        assert_eq!(
            extract(html),
            vec!["https://example.com/valid", "https://example.com/another-valid"]
        );
    }

    #[test]
    fn test_empty_document() {
        assert!(extract("").is_empty());
    }
}
