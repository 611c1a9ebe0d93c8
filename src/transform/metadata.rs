use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Title used when neither `<title>` nor `<h1>` has text
pub const UNTITLED: &str = "Untitled Page";

/// Document metadata, as written to JSON output and page headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub url: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub language: String,
    pub canonical: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub twitter_card: String,
    pub twitter_title: String,
    pub twitter_description: String,
    pub twitter_image: String,
}

/// Extracts metadata from a document
///
/// # Rules
///
/// - Title: `<title>`, then the first `<h1>`, then "Untitled Page"
/// - `<meta name|property=... content=...>`: the first non-empty value wins per field
/// - An empty description is backfilled from `og:description`
/// - Language from `<html lang>`, default `en`
/// - Canonical from `<link rel="canonical">` resolved against the page URL, default the page URL
pub fn extract_metadata(document: &Html, page_url: &Url) -> PageMetadata {
    let mut metadata = PageMetadata {
        url: page_url.to_string(),
        title: first_text(document, "title")
            .or_else(|| first_text(document, "h1"))
            .unwrap_or_else(|| UNTITLED.to_string()),
        ..Default::default()
    };

    if let Ok(selector) = Selector::parse("meta[content]") {
        for meta in document.root_element().select(&selector) {
            let element = meta.value();
            let Some(key) = element.attr("name").or_else(|| element.attr("property")) else {
                continue;
            };
            let content = element.attr("content").unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let field = match key.trim().to_ascii_lowercase().as_str() {
                "description" => &mut metadata.description,
                "keywords" => &mut metadata.keywords,
                "author" => &mut metadata.author,
                "og:title" => &mut metadata.og_title,
                "og:description" => &mut metadata.og_description,
                "og:image" => &mut metadata.og_image,
                "twitter:card" => &mut metadata.twitter_card,
                "twitter:title" => &mut metadata.twitter_title,
                "twitter:description" => &mut metadata.twitter_description,
                "twitter:image" => &mut metadata.twitter_image,
                _ => continue,
            };
            if field.is_empty() {
                *field = content.to_string();
            }
        }
    }

    if metadata.description.is_empty() {
        metadata.description = metadata.og_description.clone();
    }

    metadata.language =
        first_attr(document, "html[lang]", "lang").unwrap_or_else(|| "en".to_string());

    metadata.canonical = first_attr(document, "link[rel='canonical'][href]", "href")
        .map(|href| {
            page_url
                .join(&href)
                .map(|url| url.to_string())
                .unwrap_or(href)
        })
        .unwrap_or_else(|| page_url.to_string());

    metadata
}

/// Trimmed text of the first element matching `selector` that has any
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .root_element()
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .root_element()
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/guide").unwrap()
    }

    fn extract(html: &str) -> PageMetadata {
        extract_metadata(&Html::parse_document(html), &page_url())
    }

    #[test]
    fn test_full_metadata() {
        let meta = extract(
            r#"<html lang="fr"><head>
                <title> Guide  Title </title>
                <meta name="description" content="A guide">
                <meta name="keywords" content="a, b">
                <meta name="author" content="Jo">
                <meta property="og:title" content="OG">
                <meta property="og:image" content="https://example.com/og.png">
                <meta name="twitter:card" content="summary">
                <link rel="canonical" href="/guide/">
            </head><body><h1>Heading</h1></body></html>"#,
        );

        assert_eq!(meta.title, "Guide Title");
        assert_eq!(meta.description, "A guide");
        assert_eq!(meta.keywords, "a, b");
        assert_eq!(meta.author, "Jo");
        assert_eq!(meta.og_title, "OG");
        assert_eq!(meta.og_image, "https://example.com/og.png");
        assert_eq!(meta.twitter_card, "summary");
        assert_eq!(meta.language, "fr");
        assert_eq!(meta.canonical, "https://example.com/guide/");
        assert_eq!(meta.url, "https://example.com/guide");
    }

    #[test]
    fn test_title_fallbacks() {
        assert_eq!(
            extract("<html><body><h1>Only H1</h1><h1>Second</h1></body></html>").title,
            "Only H1"
        );
        assert_eq!(
            extract("<html><head><title>  </title></head><body><h1>H</h1></body></html>").title,
            "H"
        );
        assert_eq!(extract("<html><body><p>text</p></body></html>").title, UNTITLED);
    }

    #[test]
    fn test_title_ignores_removed_header() {
        let mut doc = Html::parse_document(
            "<html><body><header><h1>Site Name</h1></header><h1>Article</h1></body></html>",
        );
        crate::transform::Cleaner::new(&["header"]).clean(&mut doc);
        assert_eq!(extract_metadata(&doc, &page_url()).title, "Article");
    }

    #[test]
    fn test_defaults() {
        let meta = extract("<html><body><p>text</p></body></html>");
        assert_eq!(meta.language, "en");
        assert_eq!(meta.canonical, "https://example.com/guide");
        assert_eq!(meta.description, "");
    }

    #[test]
    fn test_first_non_empty_wins() {
        let meta = extract(
            r#"<html><head>
                <meta name="description" content="">
                <meta name="description" content="First">
                <meta name="description" content="Second">
            </head><body></body></html>"#,
        );
        assert_eq!(meta.description, "First");
    }

    #[test]
    fn test_og_description_backfills() {
        let meta = extract(
            r#"<html><head><meta property="og:description" content="From OG"></head></html>"#,
        );
        assert_eq!(meta.description, "From OG");
        assert_eq!(meta.og_description, "From OG");
    }
}
