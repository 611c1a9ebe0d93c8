//! Site-Scribe: a resumable single-site crawler
//!
//! This crate crawls a website from a seed URL, stays on the seed's hostname,
//! converts every page into a markdown, HTML or JSON document and keeps a
//! checkpoint on disk so an interrupted crawl can pick up where it stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod progress;
pub mod state;
pub mod transform;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Scribe operations
///
/// Only errors that abort a whole crawl surface through this type. Per-page
/// failures are recorded on the page and the crawl continues.
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to persist checkpoint: {0}")]
    Checkpoint(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid crawl phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Site-Scribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;

// Re-export commonly used types
pub use config::{CrawlJob, OutputFormat};
pub use crawler::{Coordinator, CrawlSummary};
pub use progress::{CrawlEvent, ProgressEvent};
pub use state::{CrawlPhase, PageRecord};
