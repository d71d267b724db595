use crate::links::{LinkCollector, LinkExtractor};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// `href="..."`, `src='...'`, `action = "..."`, any case
///
/// The name must not follow a word character or `-`, so `data-src` and
/// `data-href` are not matched.
const ATTRIBUTE_PATTERN: &str =
    r#"(?i)(?:^|[^\w-])(?:href|src|action)\s*=\s*(?:"([^"]*)"|'([^']*)')"#;

/// CSS `url(...)`, quoted or bare
const CSS_URL_PATTERN: &str = r#"(?i)\burl\(\s*(?:"([^"]*)"|'([^']*)'|([^'")\s]+))\s*\)"#;

fn attribute_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(ATTRIBUTE_PATTERN).expect("attribute pattern is valid"))
}

fn css_url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(CSS_URL_PATTERN).expect("css url pattern is valid"))
}

/// Returns the raw references inside CSS `url(...)` tokens of `text`
pub(crate) fn css_urls(text: &str) -> Vec<&str> {
    css_url_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str())
        .collect()
}

/// Pattern-matching extractor
///
/// Does not build a document tree, so it also finds references in markup a
/// parser would reject, and in inline scripts that assign `src="..."` strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternLinkExtractor;

impl PatternLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for PatternLinkExtractor {
    fn extract_links(&self, html: &str, base_url: &Url) -> Vec<String> {
        let mut collector = LinkCollector::default();

        for caps in attribute_regex().captures_iter(html) {
            if let Some(value) = caps.get(1).or_else(|| caps.get(2)) {
                collector.push(&value.as_str().replace("&amp;", "&"), base_url);
            }
        }

        for raw in css_urls(html) {
            collector.push(raw, base_url);
        }

        collector.finish()
    }
}
