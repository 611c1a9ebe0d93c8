use crate::url::ExcludeMatcher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// File configuration for Site-Scribe
///
/// Every section is optional; a missing key falls back to the built-in
/// default. Keys are kebab-case, like `max-pages` or `image-link-text`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub request: RequestConfig,
    pub output: OutputConfig,
    pub content: ContentConfig,
    pub markdown: MarkdownStyle,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of pages fetched concurrently
    pub concurrency: usize,

    /// Request timeout (milliseconds)
    pub timeout: u64,

    /// Retry attempts for rate-limited or timed out requests
    pub max_retries: u32,

    /// Starting delay before each request (milliseconds)
    pub initial_delay: u64,

    /// Upper bound for the adaptive delay (milliseconds)
    pub max_delay: u64,

    /// Maximum number of URLs the crawl will ever queue
    pub max_pages: usize,

    /// Checkpoint after every N successful pages
    pub save_state_interval: usize,

    /// Regular expressions; a URL matching any of them is never queued
    pub exclude_patterns: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout: 10_000,
            max_retries: 3,
            initial_delay: 1_000,
            max_delay: 60_000,
            max_pages: 5_000,
            save_state_interval: 10,
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

/// Outgoing request configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RequestConfig {
    pub user_agent: String,
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        );
        headers.insert("Accept-Language".to_string(), "en-US,en;q=0.5".to_string());
        headers.insert("Upgrade-Insecure-Requests".to_string(), "1".to_string());

        Self {
            user_agent: "Mozilla/5.0 (compatible; SiteScribe/1.0)".to_string(),
            headers,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Output directory; derived from the seed domain when unset
    pub directory: Option<PathBuf>,
    pub format: OutputFormat,
    pub include_metadata: bool,
    pub include_timestamps: bool,
    pub download_images: bool,
    pub image_link_text: ImageLinkText,
    /// Completion webhook
    pub webhook: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            format: OutputFormat::Markdown,
            include_metadata: true,
            include_timestamps: true,
            download_images: false,
            image_link_text: ImageLinkText::Alt,
            webhook: None,
        }
    }
}

/// Content cleaning configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContentConfig {
    /// CSS selectors of elements removed before conversion
    pub remove_elements: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            remove_elements: default_remove_elements(),
        }
    }
}

/// Markdown rendering options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MarkdownStyle {
    pub heading_style: HeadingStyle,
    pub code_block_style: CodeBlockStyle,
    pub em_delimiter: String,
    pub strong_delimiter: String,
    pub bullet_list_marker: String,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            em_delimiter: "*".to_string(),
            strong_delimiter: "**".to_string(),
            bullet_list_marker: "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    /// `# Title`
    #[default]
    Atx,
    /// Underlined with `===` / `---` (h1 and h2 only)
    Setext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeBlockStyle {
    #[default]
    Fenced,
    Indented,
}

/// Which text is used when an `<img>` is turned into a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLinkText {
    #[default]
    Alt,
    Title,
    Filename,
    Url,
}

/// Serialization format of page files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "md")]
    Markdown,
    #[serde(rename = "html")]
    Html,
    #[serde(rename = "json")]
    Json,
}

impl OutputFormat {
    /// File extension used for page files, also the CLI spelling
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{}' (expected md, html or json)", other)),
        }
    }
}

/// Immutable per-run configuration
///
/// Assembled once from the file configuration, the seed URL and the
/// command-line overrides (see [`crate::config::build_job`]), then shared
/// read-only by every worker.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub seed: Url,
    /// Hostname of the seed; only links on this host are followed
    pub origin_domain: String,
    pub output_dir: PathBuf,

    pub concurrency: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_pages: usize,
    pub save_state_interval: usize,
    pub exclude: ExcludeMatcher,

    pub user_agent: String,
    pub headers: BTreeMap<String, String>,

    pub remove_selectors: Vec<String>,
    pub format: OutputFormat,
    pub include_metadata: bool,
    pub include_timestamps: bool,
    pub download_images: bool,
    pub image_link_text: ImageLinkText,
    pub markdown: MarkdownStyle,

    pub webhook: Option<Url>,
    pub dry_run: bool,
    /// Verbose per-URL diagnostics
    pub debug: bool,
}

fn default_exclude_patterns() -> Vec<String> {
    [
        // Binary and media files
        r"(?i)\.(pdf|doc|docx|xls|xlsx|ppt|pptx|zip|rar|exe|dmg|mp4|avi|mov|wmv|flv|webm|mp3|wav|ogg|flac)$",
        // Admin and infrastructure paths
        r"(?i)/admin/",
        r"(?i)/login/",
        r"(?i)/api/",
        r"(?i)/wp-admin/",
        r"(?i)/wp-content/uploads/",
        r"(?i)/wp-includes/",
        r"(?i)/cgi-bin/",
        r"(?i)/tmp/",
        r"(?i)/temp/",
        r"(?i)/cache/",
        r"(?i)/logs/",
        // Listing and feed paths
        r"(?i)/search/",
        r"(?i)/tag/",
        r"(?i)/category/",
        r"(?i)/author/",
        r"(?i)/date/",
        r"(?i)/page/",
        r"(?i)/feed/",
        r"(?i)/rss/",
        r"(?i)/atom/",
        r"(?i)/xml/",
        r"(?i)/json/",
        // Social media
        r"(?i)facebook\.com",
        r"(?i)twitter\.com",
        r"(?i)instagram\.com",
        r"(?i)linkedin\.com",
        r"(?i)youtube\.com",
        r"(?i)vimeo\.com",
        // Analytics and tracking
        r"(?i)google-analytics",
        r"(?i)googletagmanager",
        r"(?i)facebook\.net",
        r"(?i)doubleclick\.net",
        r"(?i)googlesyndication",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_remove_elements() -> Vec<String> {
    [
        // Navigation and menus
        "nav",
        ".navbar",
        ".menu",
        ".navigation",
        "[role=\"navigation\"]",
        ".nav",
        ".header-nav",
        // Headers and footers
        "header",
        "footer",
        ".footer",
        ".site-footer",
        ".site-header",
        // Sidebars and widgets
        "aside",
        ".sidebar",
        ".side-nav",
        ".widget",
        ".widget-area",
        // Advertising
        ".ad",
        ".ads",
        ".advertisement",
        ".banner",
        ".promo",
        ".sponsored",
        // Social media
        ".social",
        ".social-media",
        ".share-buttons",
        ".social-share",
        // Comments
        ".comments",
        ".comment-section",
        "#comments",
        ".user-content",
        // Breadcrumbs and pagination
        ".breadcrumb",
        ".breadcrumbs",
        ".pagination",
        ".pager",
        // Forms
        "form[role=\"search\"]",
        ".search-form",
        ".newsletter",
        ".email-signup",
        ".subscribe",
        // Notices and popups
        ".cookie-notice",
        ".cookie-banner",
        ".gdpr-notice",
        ".popup",
        ".modal",
        ".overlay",
        ".lightbox",
        // Tracking pixels
        "img[width=\"1\"]",
        "img[height=\"1\"]",
        ".analytics",
        ".tracking",
        // Empty elements
        "div:empty",
        "p:empty",
        "span:empty",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
