//! HTML link extraction
//!
//! Links are taken from the cleaned document: elements detached by the
//! page cleaner are not visited, so removed navigation and pagination
//! blocks do not feed the frontier.

use crate::url::resolve_and_normalize;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts every followable link from a parsed document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document that is still attached
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to an http(s) URL with a host
///
/// Results are normalized (fragment and tracking parameters removed, query
/// sorted) and deduplicated, keeping document order. Domain filtering is left
/// to the frontier.
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `base_url` - The final URL of the page, after redirects
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut push = |href: &str| {
        if let Some(url) = resolve_link(href, base_url) {
            if seen.insert(url.to_string()) {
                links.push(url);
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.root_element().select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.root_element().select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Parses `html` and extracts its links
pub fn extract_links_from_html(html: &str, base_url: &Url) -> Vec<Url> {
    extract_links(&Html::parse_document(html), base_url)
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be skipped.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    resolve_and_normalize(base_url, href).ok()
}
