//! Crawler coordinator - crawl setup and resumption
//!
//! This module prepares a run before the scheduler takes over:
//! - Creating the output directory layout
//! - Loading the checkpoint of an interrupted run
//! - Seeding the frontier
//! - Announcing completion on the event channel

use crate::config::CrawlJob;
use crate::crawler::pipeline::PagePipeline;
use crate::crawler::scheduler::Scheduler;
use crate::crawler::{CrawlSummary, HttpFetcher, PageFetcher};
use crate::output::{Checkpoint, OutputLayout};
use crate::progress::{CrawlEvent, ProgressReporter};
use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Main crawler coordinator structure
pub struct Coordinator {
    job: Arc<CrawlJob>,
    scheduler: Scheduler,
    events: Option<mpsc::Sender<CrawlEvent>>,
}

impl Coordinator {
    /// Creates a coordinator ready to run
    ///
    /// # Arguments
    ///
    /// * `job` - The validated crawl job
    /// * `fetcher` - Source of pages and image bytes
    /// * `events` - Optional channel for progress and completion events
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Output directories exist and the frontier is seeded
    /// * `Err(ScribeError)` - The output directory could not be created
    pub fn new(
        job: CrawlJob,
        fetcher: Arc<dyn PageFetcher>,
        events: Option<mpsc::Sender<CrawlEvent>>,
    ) -> Result<Self> {
        let job = Arc::new(job);
        let layout = OutputLayout::new(&job.output_dir);

        // Dry runs write nothing, not even directories
        if !job.dry_run {
            layout.create()?;
        }

        let checkpoint = match Checkpoint::load(&layout.state_path()) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable checkpoint {}: {}",
                    layout.state_path().display(),
                    e
                );
                None
            }
        };

        let pipeline = Arc::new(PagePipeline::new(&job, fetcher, &layout));
        let reporter = ProgressReporter::new(events.clone());
        let mut scheduler = Scheduler::new(Arc::clone(&job), pipeline, layout, reporter);

        match checkpoint {
            Some(checkpoint) => scheduler.restore(checkpoint),
            None => tracing::info!("Starting new crawl of {}", job.seed),
        }
        scheduler.seed(&job.seed);

        Ok(Self {
            job,
            scheduler,
            events,
        })
    }

    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    /// Runs the crawl until the frontier drains
    ///
    /// A [`CrawlEvent::Completed`] is published on success.
    pub async fn run(self) -> Result<CrawlSummary> {
        let summary = self.scheduler.run().await?;

        if let Some(events) = &self.events {
            if events.send(CrawlEvent::Completed(summary.clone())).await.is_err() {
                tracing::debug!("Event receiver dropped before completion");
            }
        }

        Ok(summary)
    }
}

/// Runs a crawl over plain HTTP
///
/// This function orchestrates the entire crawl process:
///
/// 1. Build the HTTP fetcher from the job's request settings
/// 2. Create the output layout and resume from `state.json` if present
/// 3. Crawl until nothing is queued or in flight
/// 4. Write the final checkpoint and sitemap, then fire the webhook
///
/// # Example
///
/// ```no_run
/// use site_scribe::config::{build_job, Config, JobOverrides};
/// use site_scribe::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let job = build_job("https://example.com/", Config::default(), JobOverrides::default())?;
/// let summary = run_crawl(job, None).await?;
/// println!("{} pages written", summary.successful_pages);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    job: CrawlJob,
    events: Option<mpsc::Sender<CrawlEvent>>,
) -> Result<CrawlSummary> {
    let fetcher = Arc::new(HttpFetcher::new(&job)?);
    Coordinator::new(job, fetcher, events)?.run().await
}
