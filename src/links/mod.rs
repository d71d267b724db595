//! Link extraction from HTML
//!
//! A [`LinkExtractor`] turns the text of an HTML page into the absolute URLs it
//! references. Extraction is pure: no network, no side effects, and the same input
//! always yields the same list. Two implementations exist:
//! - [`PatternLinkExtractor`]: a lightweight scan for `href`, `src`, `action` and
//!   CSS `url(...)` references, tolerant of broken markup
//! - [`HtmlLinkExtractor`]: a full HTML parse, for pages where the pattern scan
//!   picks up references from comments or script text

mod html;
mod pattern;

pub use html::HtmlLinkExtractor;
pub use pattern::PatternLinkExtractor;

use crate::config::ExtractorKind;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Extracts candidate URLs from an HTML document
pub trait LinkExtractor: Send + Sync {
    /// Returns absolute http(s) URLs referenced by `html`, resolved against
    /// `base_url`, without fragments and without duplicates
    ///
    /// Order is first occurrence in the document. It does not affect which URLs
    /// are found, only the order a crawler visits them in.
    fn extract_links(&self, html: &str, base_url: &Url) -> Vec<String>;
}

/// Builds the extractor selected in configuration
pub fn extractor_for(kind: ExtractorKind) -> Arc<dyn LinkExtractor> {
    match kind {
        ExtractorKind::Pattern => Arc::new(PatternLinkExtractor::new()),
        ExtractorKind::Html => Arc::new(HtmlLinkExtractor::new()),
    }
}

/// Resolves a raw reference to an absolute URL string
///
/// Returns None if the reference should be dropped:
/// - empty or fragment-only references
/// - javascript:, mailto:, tel:, data: and any other non-HTTP(S) scheme
/// - references that do not parse
fn resolve_reference(raw: &str, base_url: &Url) -> Option<String> {
    let raw = raw.trim();

    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let mut absolute = base_url.join(raw).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute.to_string())
}

/// Collects resolved references, keeping the first occurrence of each
#[derive(Default)]
struct LinkCollector {
    seen: HashSet<String>,
    links: Vec<String>,
}

impl LinkCollector {
    fn push(&mut self, raw: &str, base_url: &Url) {
        if let Some(link) = resolve_reference(raw, base_url) {
            if self.seen.insert(link.clone()) {
                self.links.push(link);
            }
        }
    }

    fn finish(self) -> Vec<String> {
        self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/games/index.html").unwrap()
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_reference("snake.html", &base_url()),
            Some("https://example.com/games/snake.html".to_string())
        );
        assert_eq!(
            resolve_reference("/about", &base_url()),
            Some("https://example.com/about".to_string())
        );
        assert_eq!(
            resolve_reference("../img/a.png", &base_url()),
            Some("https://example.com/img/a.png".to_string())
        );
    }

    #[test]
    fn test_resolve_strips_fragment() {
        assert_eq!(
            resolve_reference("/about#team", &base_url()),
            Some("https://example.com/about".to_string())
        );
    }

    #[test]
    fn test_resolve_protocol_relative() {
        assert_eq!(
            resolve_reference("//cdn.example.net/lib.js", &base_url()),
            Some("https://cdn.example.net/lib.js".to_string())
        );
    }

    #[test]
    fn test_resolve_drops_non_http() {
        assert_eq!(resolve_reference("javascript:void(0)", &base_url()), None);
        assert_eq!(resolve_reference("mailto:a@example.com", &base_url()), None);
        assert_eq!(resolve_reference("tel:+15551234", &base_url()), None);
        assert_eq!(resolve_reference("data:image/png;base64,AAAA", &base_url()), None);
        assert_eq!(resolve_reference("#top", &base_url()), None);
        assert_eq!(resolve_reference("   ", &base_url()), None);
    }

    #[test]
    fn test_resolve_drops_malformed() {
        assert_eq!(resolve_reference("http://[::1", &base_url()), None);
    }

    #[test]
    fn test_extractor_for_kind() {
        let html = r#"<a href="/x">x</a>"#;
        for kind in [ExtractorKind::Pattern, ExtractorKind::Html] {
            let links = extractor_for(kind).extract_links(html, &base_url());
            assert_eq!(links, vec!["https://example.com/x".to_string()]);
        }
    }
}
