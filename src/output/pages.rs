use crate::config::OutputFormat;
use crate::output::{OutputError, OutputResult};
use crate::state::ContentStatistics;
use crate::transform::{PageMetadata, TransformedPage};
use crate::url::filename_for_url;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// JSON page document
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageDocument<'a> {
    metadata: &'a PageMetadata,
    content: &'a str,
    statistics: &'a ContentStatistics,
    scraped_at: String,
}

/// File name (relative to `pages/`) for a page URL
pub fn page_filename(url: &Url, format: OutputFormat) -> String {
    format!("{}.{}", filename_for_url(url), format.extension())
}

/// Page file name with a short hash of the full URL appended to the stem
///
/// Used when another URL already sanitized to the same name.
pub fn disambiguated_filename(url: &Url, format: OutputFormat) -> String {
    let digest = hex::encode(Sha256::digest(url.as_str().as_bytes()));
    format!(
        "{}-{}.{}",
        filename_for_url(url),
        &digest[..8],
        format.extension()
    )
}

/// Renders the full file contents for a page
///
/// # Formats
///
/// - `md`: H1 title, optional metadata block, content, optional timestamp footer
/// - `html`: standalone document with a metadata header and the cleaned body
/// - `json`: `{metadata, content, statistics, scrapedAt}`
///
/// `scraped_at` is the only input that varies between runs over the same page.
pub fn render_page(
    page: &TransformedPage,
    format: OutputFormat,
    include_metadata: bool,
    include_timestamps: bool,
    scraped_at: DateTime<Utc>,
) -> OutputResult<String> {
    let timestamp = scraped_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    match format {
        OutputFormat::Markdown => Ok(render_markdown(
            page,
            include_metadata,
            include_timestamps.then_some(timestamp.as_str()),
        )),
        OutputFormat::Html => Ok(render_html(
            page,
            include_timestamps.then_some(timestamp.as_str()),
        )),
        OutputFormat::Json => {
            let document = PageDocument {
                metadata: &page.metadata,
                content: &page.content,
                statistics: &page.statistics,
                scraped_at: timestamp,
            };
            Ok(serde_json::to_string_pretty(&document)?)
        }
    }
}

/// Writes a rendered page under `pages_dir`
///
/// # Returns
///
/// The path of the written file
pub fn write_page(pages_dir: &Path, filename: &str, contents: &str) -> OutputResult<PathBuf> {
    let path = pages_dir.join(filename);
    fs::write(&path, contents).map_err(|e| OutputError::io(&path, e))?;
    Ok(path)
}

fn render_markdown(
    page: &TransformedPage,
    include_metadata: bool,
    timestamp: Option<&str>,
) -> String {
    let meta = &page.metadata;
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", meta.title));

    if include_metadata {
        md.push_str(&format!("**URL:** {}  \n", meta.url));
        md.push_str(&format!("**Canonical:** {}  \n", meta.canonical));
        md.push_str(&format!("**Language:** {}  \n", meta.language));
        for (label, value) in [
            ("Description", &meta.description),
            ("Author", &meta.author),
            ("Keywords", &meta.keywords),
            ("OG Image", &meta.og_image),
        ] {
            if !value.is_empty() {
                md.push_str(&format!("**{}:** {}  \n", label, value));
            }
        }
        md.push_str("\n---\n\n");
    }

    md.push_str(&page.content);

    if let Some(timestamp) = timestamp {
        md.push_str(&format!("\n\n---\n\n*Scraped on: {}*", timestamp));
    }

    md.push('\n');
    md
}

fn render_html(page: &TransformedPage, timestamp: Option<&str>) -> String {
    let meta = &page.metadata;
    let scraped = timestamp
        .map(|ts| format!("\n        <p><strong>Scraped:</strong> {}</p>", ts))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
    <meta name="keywords" content="{keywords}">
    <meta name="author" content="{author}">
    <link rel="canonical" href="{canonical}">
</head>
<body>
    <h1>{title}</h1>
    <div class="metadata">
        <p><strong>URL:</strong> <a href="{url}">{url}</a></p>{scraped}
    </div>
    <div class="content">
{content}
    </div>
</body>
</html>
"#,
        lang = escape(&meta.language),
        title = escape(&meta.title),
        description = escape(&meta.description),
        keywords = escape(&meta.keywords),
        author = escape(&meta.author),
        canonical = escape(&meta.canonical),
        url = escape(&meta.url),
        scraped = scraped,
        content = page.content,
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
