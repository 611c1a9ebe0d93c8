//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier and the adaptive request delay
//! - HTTP fetching behind the [`PageFetcher`] trait
//! - Link extraction
//! - The per-page pipeline and the scheduler driving it
//! - Crawl setup, resumption and the completion webhook

mod backoff;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod pipeline;
mod scheduler;
pub mod webhook;

pub use backoff::{Backoff, BackoffStats, MIN_DELAY_MS};
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use frontier::{EnqueueDecision, Frontier};
pub use parser::{extract_links, extract_links_from_html};
pub use pipeline::{PageOutcome, PagePipeline};
pub use scheduler::Scheduler;

use crate::state::PageFailure;
use std::path::PathBuf;
use std::time::Duration;

/// Final report of a crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub domain: String,
    pub start_url: String,
    pub output_dir: PathBuf,
    /// Entries in the sitemap
    pub total_pages: usize,
    pub successful_pages: usize,
    pub failed_pages: usize,
    pub downloaded_images: usize,
    pub discovered_urls: usize,
    pub failures: Vec<PageFailure>,
    pub elapsed: Duration,
    pub backoff: BackoffStats,
    pub dry_run: bool,
}
