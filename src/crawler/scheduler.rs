//! Scheduler driving the crawl
//!
//! This module handles:
//! - Bounded concurrency: at most `concurrency` pipelines in flight
//! - Applying page outcomes to the frontier, counters and sitemap
//! - Retries with adaptive backoff for transient fetch errors
//! - Periodic checkpoints and the final drain
//!
//! Workers run as a [`FuturesUnordered`] on the scheduler's own task. They
//! only return outcomes; every mutation of crawl state happens here,
//! between polls, so nothing needs a lock.

use crate::config::CrawlJob;
use crate::crawler::pipeline::{PageOutcome, PagePipeline};
use crate::crawler::{webhook, Backoff, CrawlSummary, FetchError, Frontier};
use crate::output::{
    disambiguated_filename, page_filename, write_sitemap, Checkpoint, OutputLayout, SitemapContext,
};
use crate::progress::{CrawlEvent, ProgressReporter, ProgressSnapshot};
use crate::state::{CrawlPhase, DownloadedImage, PageFailure, PageRecord};
use crate::{Result, ScribeError};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// Owns all mutable crawl state for one run
pub struct Scheduler {
    job: Arc<CrawlJob>,
    pipeline: Arc<PagePipeline>,
    layout: OutputLayout,
    phase: CrawlPhase,

    frontier: Frontier,
    backoff: Backoff,
    reporter: ProgressReporter,

    /// Retry attempts per URL, cleared on a terminal outcome
    retries: HashMap<String, u32>,
    sitemap: Vec<PageRecord>,
    failures: Vec<PageFailure>,
    images: Vec<DownloadedImage>,
    image_keys: HashSet<String>,
    /// Page file name to the URL written under it
    filenames: HashMap<String, String>,
    successful: usize,
    failed: usize,
    since_checkpoint: usize,
    current_url: String,
}

impl Scheduler {
    /// Creates an idle scheduler with an empty frontier
    pub fn new(
        job: Arc<CrawlJob>,
        pipeline: Arc<PagePipeline>,
        layout: OutputLayout,
        reporter: ProgressReporter,
    ) -> Self {
        Self {
            frontier: Frontier::for_job(&job),
            backoff: Backoff::new(job.initial_delay, job.max_delay),
            job,
            pipeline,
            layout,
            phase: CrawlPhase::Idle,
            reporter,
            retries: HashMap::new(),
            sitemap: Vec::new(),
            failures: Vec::new(),
            images: Vec::new(),
            image_keys: HashSet::new(),
            filenames: HashMap::new(),
            successful: 0,
            failed: 0,
            since_checkpoint: 0,
            current_url: String::new(),
        }
    }

    /// Loads the frontier, counters and sitemap from a checkpoint
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        tracing::info!(
            "Resuming: {} visited, {} to visit, {} pages written",
            checkpoint.visited.len(),
            checkpoint.to_visit.len(),
            checkpoint.sitemap.len()
        );

        self.frontier.restore(
            checkpoint.visited,
            checkpoint.to_visit,
            checkpoint.unique_urls_discovered,
        );
        self.successful = checkpoint.successful_pages;
        self.failed = checkpoint.failed_pages;
        self.filenames = checkpoint
            .sitemap
            .iter()
            .map(|record| (record.filename.clone(), record.url.clone()))
            .collect();
        self.sitemap = checkpoint.sitemap;
        self.failures = checkpoint.failures;
        for image in checkpoint.downloaded_images {
            self.add_image(image);
        }
    }

    /// Offers the seed URL; a no-op if it is already visited or queued
    pub fn seed(&mut self, url: &Url) {
        let decision = self.frontier.enqueue(url);
        tracing::debug!("Seed {}: {:?}", url, decision);
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl drained normally (failed pages included)
    /// * `Err(ScribeError)` - A fatal filesystem error aborted the crawl
    pub async fn run(mut self) -> Result<CrawlSummary> {
        self.phase.transition(CrawlPhase::Running)?;

        let outcome = if self.job.dry_run {
            self.list_dry_run().await;
            Ok(())
        } else {
            self.crawl().await
        };

        match outcome {
            Ok(()) => self.drain().await,
            Err(e) => {
                tracing::error!("Crawl aborted: {}", e);
                self.phase.transition(CrawlPhase::Failed)?;
                self.phase.transition(CrawlPhase::Terminated)?;
                Err(e)
            }
        }
    }

    async fn crawl(&mut self) -> Result<()> {
        tracing::info!(
            "Crawling {} with {} workers ({} queued)",
            self.job.origin_domain,
            self.job.concurrency,
            self.frontier.queue_len()
        );

        let mut workers = FuturesUnordered::new();

        loop {
            let free = self.job.concurrency.saturating_sub(workers.len());
            for url in self.frontier.dequeue_up_to(free) {
                let delay = self.backoff.current();
                let filename = self.claim_filename(&url);
                let pipeline = Arc::clone(&self.pipeline);
                workers.push(pipeline.process(url, filename, delay));
            }

            match workers.next().await {
                Some(outcome) => self.apply(outcome)?,
                // Nothing in flight and nothing left to dequeue
                None => break,
            }
        }

        tracing::info!(
            "Frontier drained: {} written, {} failed",
            self.successful,
            self.failed
        );
        Ok(())
    }

    /// Applies one worker outcome to the crawl state
    fn apply(&mut self, outcome: PageOutcome) -> Result<()> {
        self.current_url = outcome.url().to_string();

        match outcome {
            PageOutcome::Written {
                url,
                record,
                links,
                images,
            } => {
                tracing::info!("Wrote {} -> {}", url, record.filename);
                self.frontier.complete(&url);
                self.retries.remove(url.as_str());
                self.successful += 1;
                self.backoff.on_success();
                self.sitemap.push(record);
                for image in images {
                    self.add_image(image);
                }
                self.enqueue_links(&links);

                self.since_checkpoint += 1;
                if self.since_checkpoint >= self.job.save_state_interval {
                    self.save_checkpoint()?;
                }
            }
            PageOutcome::FetchFailed { url, error } => self.handle_fetch_error(url, error),
            PageOutcome::Rejected { url, reason, links } => {
                self.enqueue_links(&links);
                self.record_failure(&url, reason);
            }
        }

        let snapshot = self.snapshot();
        self.reporter.report(&snapshot);
        Ok(())
    }

    fn handle_fetch_error(&mut self, url: Url, error: FetchError) {
        if error.is_rate_limit() {
            self.backoff.on_rate_limited();
        }

        if let FetchError::MalformedUrl(reason) = &error {
            tracing::debug!("Skipping malformed URL {}: {}", url, reason);
            self.frontier.release(&url);
            return;
        }

        if error.is_transient() {
            let attempts = self.retries.entry(url.to_string()).or_insert(0);
            if *attempts < self.job.max_retries {
                *attempts += 1;
                tracing::warn!(
                    "{} for {}, retry {}/{} after {:?}",
                    error,
                    url,
                    attempts,
                    self.job.max_retries,
                    self.backoff.current()
                );
                self.frontier.requeue_front(url);
                return;
            }
        }

        self.record_failure(&url, error.to_string());
    }

    fn record_failure(&mut self, url: &Url, error: String) {
        tracing::warn!("Failed {}: {}", url, error);
        self.frontier.complete(url);
        self.retries.remove(url.as_str());
        self.failed += 1;
        self.failures.push(PageFailure {
            url: url.to_string(),
            error,
            failed_at: Utc::now(),
        });
    }

    fn enqueue_links(&mut self, links: &[Url]) {
        for link in links {
            let decision = self.frontier.enqueue(link);
            if self.job.debug && !decision.is_accepted() {
                tracing::debug!("Not queueing {}: {:?}", link, decision);
            }
        }
    }

    /// Page file name for `url`, unique across the run
    ///
    /// A URL keeps the name it first claimed, so retries overwrite their own
    /// file. A different URL whose name is taken gets a hashed suffix.
    fn claim_filename(&mut self, url: &Url) -> String {
        let name = page_filename(url, self.job.format);
        match self.filenames.get(&name) {
            Some(owner) if owner != url.as_str() => {
                let unique = disambiguated_filename(url, self.job.format);
                tracing::warn!(
                    "{} and {} both map to {}; writing {} as {}",
                    owner,
                    url,
                    name,
                    url,
                    unique
                );
                self.filenames.insert(unique.clone(), url.to_string());
                unique
            }
            Some(_) => name,
            None => {
                self.filenames.insert(name.clone(), url.to_string());
                name
            }
        }
    }

    fn add_image(&mut self, image: DownloadedImage) {
        if self.image_keys.insert(image.original.clone()) {
            self.images.push(image);
        }
    }

    async fn list_dry_run(&mut self) {
        for url in self.frontier.dequeue_all() {
            tracing::debug!("[dry-run] would crawl {}", url);
            self.reporter
                .send(CrawlEvent::DryRunUrl(url.to_string()))
                .await;
            self.frontier.release(&url);
        }
    }

    async fn drain(mut self) -> Result<CrawlSummary> {
        self.phase.transition(CrawlPhase::Draining)?;

        if !self.job.dry_run {
            if let Err(e) = self.save_checkpoint() {
                self.phase.transition(CrawlPhase::Failed)?;
                self.phase.transition(CrawlPhase::Terminated)?;
                return Err(e);
            }
        }

        self.current_url.clear();
        let snapshot = self.snapshot();
        self.reporter.finish(&snapshot).await;

        let summary = self.summary();
        if let Some(webhook) = &self.job.webhook {
            if self.job.dry_run {
                tracing::info!("[dry-run] skipping webhook {}", webhook);
            } else {
                webhook::notify_completion(webhook, &summary).await;
            }
        }

        self.phase.transition(CrawlPhase::Terminated)?;
        tracing::info!(
            "Crawl finished in {:?}: {} pages, {} failed, {} images, {} rate-limit backoffs",
            summary.elapsed,
            summary.successful_pages,
            summary.failed_pages,
            summary.downloaded_images,
            summary.backoff.increases
        );
        Ok(summary)
    }

    /// Writes `state.json` and refreshes `sitemap.md`
    ///
    /// Only the checkpoint is fatal on failure.
    fn save_checkpoint(&mut self) -> Result<()> {
        let checkpoint = self.checkpoint();
        checkpoint
            .save(&self.layout.state_path())
            .map_err(|e| ScribeError::Checkpoint(e.to_string()))?;
        self.since_checkpoint = 0;
        tracing::debug!(
            "Checkpoint saved: {} visited, {} pending",
            checkpoint.visited.len(),
            checkpoint.to_visit.len()
        );

        let context = SitemapContext {
            domain: &self.job.origin_domain,
            start_url: self.job.seed.as_str(),
            format: self.job.format,
            pages: &self.sitemap,
            failures: &self.failures,
            downloaded_images: self.images.len(),
            elapsed: self.reporter.elapsed(),
            rate_limit_backoffs: self.backoff.stats().increases,
            generated_at: Utc::now(),
        };
        if let Err(e) = write_sitemap(&self.layout.sitemap_path(), &context) {
            tracing::warn!("Failed to write sitemap: {}", e);
        }

        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            visited: self.frontier.visited_sorted(),
            to_visit: self.frontier.pending(),
            sitemap: self.sitemap.clone(),
            total_pages: self.sitemap.len(),
            successful_pages: self.successful,
            failed_pages: self.failed,
            downloaded_images: self.images.clone(),
            unique_urls_discovered: self.frontier.discovered_sorted(),
            last_updated: Some(Utc::now()),
            failures: self.failures.clone(),
        }
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            discovered: self.frontier.discovered_len(),
            successful: self.successful,
            failed: self.failed,
            downloaded_images: self.images.len(),
            queue_length: self.frontier.queue_len(),
            in_flight: self.frontier.in_flight_len(),
            visited: self.frontier.visited_len(),
            current_url: self.current_url.clone(),
        }
    }

    fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            domain: self.job.origin_domain.clone(),
            start_url: self.job.seed.to_string(),
            output_dir: self.layout.root().to_path_buf(),
            total_pages: self.sitemap.len(),
            successful_pages: self.successful,
            failed_pages: self.failed,
            downloaded_images: self.images.len(),
            discovered_urls: self.frontier.discovered_len(),
            failures: self.failures.clone(),
            elapsed: self.reporter.elapsed(),
            backoff: self.backoff.stats(),
            dry_run: self.job.dry_run,
        }
    }
}
