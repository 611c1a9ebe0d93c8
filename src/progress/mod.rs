//! Progress reporting for a running crawl
//!
//! The crawl publishes [`CrawlEvent`]s on an optional channel. The CLI turns
//! progress events into `PROGRESS_UPDATE:{json}` lines on stdout, which a
//! supervising process can parse back with [`parse_progress_line`].
//!
//! Reporting never blocks the crawl: intermediate events are dropped when
//! the channel is full. The final event always gets through.

use crate::crawler::CrawlSummary;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Prefix of progress lines on stdout
pub const PROGRESS_PREFIX: &str = "PROGRESS_UPDATE:";

/// Progress never exceeds this until the crawl is drained
const MAX_RUNNING_PROGRESS: f64 = 95.0;

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Percentage, 0..=100, never decreasing within a run
    pub progress: u8,
    pub total_urls: usize,
    pub scraped_urls: usize,
    pub failed_urls: usize,
    pub downloaded_images: usize,
    pub queue_length: usize,
    pub visited_count: usize,
    /// Seconds since the crawl started
    pub elapsed: u64,
    /// Seconds, estimated from the average time per successful page
    pub estimated_remaining: u64,
    pub current_url: String,
}

impl ProgressEvent {
    /// Formats the event as a single stdout line, without the newline
    pub fn to_line(&self) -> String {
        // Serializing plain fields cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{}{}", PROGRESS_PREFIX, json)
    }
}

/// Parses a `PROGRESS_UPDATE:` line
///
/// Leading noise before the prefix is tolerated, and so is trailing data
/// after the JSON object.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let start = line.find(PROGRESS_PREFIX)? + PROGRESS_PREFIX.len();
    serde_json::Deserializer::from_str(&line[start..])
        .into_iter::<ProgressEvent>()
        .next()?
        .ok()
}

/// Events published while a crawl runs
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    Progress(ProgressEvent),
    /// A URL listed by a dry run
    DryRunUrl(String),
    Completed(CrawlSummary),
}

/// Counters the scheduler hands to the reporter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub discovered: usize,
    pub successful: usize,
    pub failed: usize,
    pub downloaded_images: usize,
    pub queue_length: usize,
    pub in_flight: usize,
    pub visited: usize,
    pub current_url: String,
}

impl ProgressSnapshot {
    fn processed(&self) -> usize {
        self.successful + self.failed
    }

    fn is_drained(&self) -> bool {
        self.queue_length == 0 && self.in_flight == 0
    }
}

/// Raw progress percentage for a snapshot
///
/// * Nothing discovered: 0
/// * Nothing queued or in flight and at least one page processed: 100
/// * Otherwise processed/discovered, capped at 95
pub fn compute_progress(snapshot: &ProgressSnapshot) -> f64 {
    if snapshot.discovered == 0 {
        return 0.0;
    }
    if snapshot.is_drained() && snapshot.processed() > 0 {
        return 100.0;
    }
    let ratio = snapshot.processed() as f64 / snapshot.discovered as f64 * 100.0;
    ratio.min(MAX_RUNNING_PROGRESS)
}

/// Builds progress events and publishes them
#[derive(Debug)]
pub struct ProgressReporter {
    sender: Option<mpsc::Sender<CrawlEvent>>,
    started: Instant,
    last_progress: u8,
}

impl ProgressReporter {
    pub fn new(sender: Option<mpsc::Sender<CrawlEvent>>) -> Self {
        Self {
            sender,
            started: Instant::now(),
            last_progress: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Builds the next event, keeping progress monotonic
    pub fn build_event(&mut self, snapshot: &ProgressSnapshot) -> ProgressEvent {
        let computed = compute_progress(snapshot).round().clamp(0.0, 100.0) as u8;
        self.last_progress = self.last_progress.max(computed);
        self.event_with(snapshot, self.last_progress)
    }

    /// Publishes an intermediate event, dropping it if the channel is full
    pub fn report(&mut self, snapshot: &ProgressSnapshot) -> ProgressEvent {
        let event = self.build_event(snapshot);
        if let Some(sender) = &self.sender {
            if sender.try_send(CrawlEvent::Progress(event.clone())).is_err() {
                tracing::trace!("Progress channel full, dropping update");
            }
        }
        event
    }

    /// Publishes the final event at 100%
    pub async fn finish(&mut self, snapshot: &ProgressSnapshot) -> ProgressEvent {
        self.last_progress = 100;
        let event = self.event_with(snapshot, 100);
        self.send(CrawlEvent::Progress(event.clone())).await;
        event
    }

    /// Publishes an event, waiting for channel capacity
    pub async fn send(&self, event: CrawlEvent) {
        if let Some(sender) = &self.sender {
            if sender.send(event).await.is_err() {
                tracing::debug!("Progress receiver dropped");
            }
        }
    }

    fn event_with(&self, snapshot: &ProgressSnapshot, progress: u8) -> ProgressEvent {
        let elapsed = self.elapsed();
        let estimated_remaining = if snapshot.successful > 0 {
            elapsed.as_secs_f64() / snapshot.successful as f64 * snapshot.queue_length as f64
        } else {
            0.0
        };

        ProgressEvent {
            progress,
            total_urls: snapshot.discovered,
            scraped_urls: snapshot.successful,
            failed_urls: snapshot.failed,
            downloaded_images: snapshot.downloaded_images,
            queue_length: snapshot.queue_length,
            visited_count: snapshot.visited,
            elapsed: elapsed.as_secs(),
            estimated_remaining: estimated_remaining.round() as u64,
            current_url: snapshot.current_url.clone(),
        }
    }
}
