//! Sitemap generation
//!
//! The sitemap is a markdown index of every page written during the crawl,
//! followed by failed URLs and run statistics.

use crate::config::OutputFormat;
use crate::output::{write_atomic, OutputResult};
use crate::state::{PageFailure, PageRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use std::time::Duration;

/// Everything the sitemap reports about a run
#[derive(Debug, Clone)]
pub struct SitemapContext<'a> {
    pub domain: &'a str,
    pub start_url: &'a str,
    pub format: OutputFormat,
    pub pages: &'a [PageRecord],
    pub failures: &'a [PageFailure],
    pub downloaded_images: usize,
    pub elapsed: Duration,
    /// How many times the request delay was doubled after a rate limit
    pub rate_limit_backoffs: u32,
    pub generated_at: DateTime<Utc>,
}

/// Writes the sitemap to `path`, replacing any previous one atomically
pub fn write_sitemap(path: &Path, context: &SitemapContext<'_>) -> OutputResult<()> {
    write_atomic(path, format_sitemap(context).as_bytes())
}

/// Formats the sitemap as markdown
///
/// Pages are listed in the order they were written.
pub fn format_sitemap(context: &SitemapContext<'_>) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Sitemap for {}\n\n", context.domain));
    md.push_str(&format!(
        "Generated on: {}\n\n",
        context.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));

    // Pages
    md.push_str(&format!("## Pages ({})\n\n", context.pages.len()));
    for page in context.pages {
        md.push_str(&format!(
            "- [{}]({}) - `{}`\n",
            escape_link_text(&page.title),
            page.url,
            page.filename
        ));
    }
    md.push('\n');

    if !context.failures.is_empty() {
        md.push_str(&format!("## Failed Pages ({})\n\n", context.failures.len()));
        for failure in context.failures {
            md.push_str(&format!("- {} - {}\n", failure.url, failure.error));
        }
        md.push('\n');
    }

    md.push_str("## Statistics\n\n");
    md.push_str(&format!(
        "- **Total Pages:** {}\n",
        context.pages.len() + context.failures.len()
    ));
    md.push_str(&format!("- **Successful Scrapes:** {}\n", context.pages.len()));
    md.push_str(&format!("- **Failed Scrapes:** {}\n", context.failures.len()));
    md.push_str(&format!(
        "- **Images Downloaded:** {}\n",
        context.downloaded_images
    ));
    md.push_str(&format!("- **Start URL:** {}\n", context.start_url));
    md.push_str(&format!("- **Base Domain:** {}\n", context.domain));
    md.push_str(&format!("- **Output Format:** {}\n", context.format));
    md.push_str(&format!(
        "- **Total Scraping Time:** {}s\n",
        context.elapsed.as_secs()
    ));
    md.push_str(&format!(
        "- **Rate Limit Backoffs:** {}\n\n",
        context.rate_limit_backoffs
    ));

    md.push_str("## Files Structure\n\n");
    md.push_str("```\n");
    md.push_str("├── sitemap.md\n");
    md.push_str("├── state.json\n");
    md.push_str(&format!("├── pages/      (*.{})\n", context.format.extension()));
    md.push_str("└── assets/     (downloaded images)\n");
    md.push_str("```\n");

    md
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}
