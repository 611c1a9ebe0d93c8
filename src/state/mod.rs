//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the scheduler's Idle/Running/Draining/Failed/Terminated machine
//! - `PageRecord`: sitemap entry for a written page, with its `ContentStatistics`
//! - `PageFailure`: a URL that permanently failed and why
//! - `DownloadedImage`: an image materialized under `assets/`

mod crawl_phase;
mod page_record;

pub use crawl_phase::CrawlPhase;
pub use page_record::{ContentStatistics, DownloadedImage, PageFailure, PageRecord};
