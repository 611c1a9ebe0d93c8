//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the job's user agent, headers and timeout
//! - GET requests for pages and image bytes
//! - Redirect handling (followed by the client; links resolve against the final URL)
//! - Error classification into transient and permanent failures
//!
//! Fetching sits behind the [`PageFetcher`] trait. [`HttpFetcher`] is the
//! plain-HTTP backend; a headless-browser backend for script-rendered pages
//! would implement the same trait.

use crate::config::CrawlJob;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Content-Type prefixes that can never be converted to a document
const NON_TEXT_CONTENT_TYPES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "font/",
    "application/pdf",
    "application/octet-stream",
    "application/zip",
];

/// Typed fetch failure
///
/// # Retry Logic
///
/// | Condition | Variant | Action |
/// |-----------|---------|--------|
/// | HTTP 429 / 403 | `RateLimited` | Double the delay, retry |
/// | Timeout | `Timeout` | Retry |
/// | Other HTTP error | `Http` | Permanent |
/// | DNS / connection / TLS | `Network` | Permanent |
/// | Binary body | `UnsupportedContent` | Permanent |
/// | Unusable URL | `MalformedUrl` | Skipped, not counted |
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("rate limited (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),

    #[error("malformed URL: {0}")]
    MalformedUrl(String),
}

impl FetchError {
    /// Returns true for failures worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout)
    }

    /// Returns true for failures that should slow the crawl down
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Maps a non-success status to its failure
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => Self::RateLimited {
                status: status.as_u16(),
            },
            _ => Self::Http {
                status: status.as_u16(),
            },
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_builder() {
            Self::MalformedUrl(error.to_string())
        } else if error.is_connect() {
            Self::Network(format!("connection failed: {}", error))
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: Url,
    /// URL after redirects
    pub final_url: Url,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// Source of documents and image bytes
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one document
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;

    /// Fetches raw bytes (used for image download)
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Plain-HTTP fetcher backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher configured from the job
    pub fn new(job: &CrawlJob) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&job.user_agent, &job.headers, job.timeout)?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        Ok(response)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self.get(url).await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_textual(&content_type) {
            return Err(FetchError::UnsupportedContent(content_type));
        }

        let body = response.text().await.map_err(FetchError::from_reqwest)?;

        Ok(FetchedPage {
            url: url.clone(),
            final_url,
            status,
            content_type,
            body,
        })
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(FetchError::from_reqwest)?;
        Ok(bytes.to_vec())
    }
}

/// Builds an HTTP client with the job's request settings
///
/// Header entries that are not valid HTTP header names or values are
/// skipped with a warning.
///
/// # Arguments
///
/// * `user_agent` - User-Agent header value
/// * `headers` - Default headers sent with every request
/// * `timeout` - Whole-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &str,
    headers: &BTreeMap<String, String>,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                default_headers.insert(name, value);
            }
            _ => tracing::warn!("Skipping invalid request header '{}'", name),
        }
    }

    Client::builder()
        .user_agent(user_agent)
        .default_headers(default_headers)
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns false for content types that are clearly binary
///
/// A missing Content-Type is treated as text.
fn is_textual(content_type: &str) -> bool {
    let lower = content_type.trim().to_ascii_lowercase();
    !NON_TEXT_CONTENT_TYPES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}
