use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content statistics of one converted page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStatistics {
    pub words: usize,
    pub characters: usize,
    pub images: usize,
    pub links: usize,
    pub headings: usize,
    pub paragraphs: usize,
    pub lists: usize,
    pub tables: usize,
    /// Length of the converted content (not of the whole page file)
    pub markdown_length: usize,
}

/// Sitemap entry for a successfully written page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// File name relative to `pages/`
    pub filename: String,
    #[serde(default)]
    pub statistics: ContentStatistics,
    pub scraped_at: DateTime<Utc>,
}

/// A URL that permanently failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFailure {
    pub url: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// An image saved under `assets/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadedImage {
    /// Absolute remote URL
    pub original: String,
    /// File name under `assets/`
    pub local: String,
}
