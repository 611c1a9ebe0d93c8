//! Completion webhook
//!
//! A single POST is sent when a crawl drains. Delivery is best effort:
//! failures are logged and never affect the crawl result.

use crate::crawler::CrawlSummary;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Request timeout for the webhook POST
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON body of the completion webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub event: &'static str,
    pub timestamp: String,
    pub domain: String,
    pub total_pages: usize,
    pub successful_pages: usize,
    pub failed_pages: usize,
    pub downloaded_images: usize,
    pub output_dir: String,
    /// Whole seconds
    pub scraping_time: u64,
}

impl WebhookPayload {
    pub fn completed(summary: &CrawlSummary, now: DateTime<Utc>) -> Self {
        Self {
            event: "scraping_completed",
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            domain: summary.domain.clone(),
            total_pages: summary.total_pages,
            successful_pages: summary.successful_pages,
            failed_pages: summary.failed_pages,
            downloaded_images: summary.downloaded_images,
            output_dir: summary.output_dir.display().to_string(),
            scraping_time: summary.elapsed.as_secs_f64().round() as u64,
        }
    }
}

/// Posts the completion payload
///
/// # Returns
///
/// `true` if the endpoint answered with a success status
pub async fn notify_completion(webhook: &Url, summary: &CrawlSummary) -> bool {
    let payload = WebhookPayload::completed(summary, Utc::now());

    let client = match Client::builder().timeout(WEBHOOK_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Failed to build webhook client: {}", e);
            return false;
        }
    };

    match client.post(webhook.clone()).json(&payload).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::info!("Webhook notified: {}", webhook);
            true
        }
        Ok(response) => {
            tracing::warn!("Webhook {} answered HTTP {}", webhook, response.status());
            false
        }
        Err(e) => {
            tracing::warn!("Failed to send webhook to {}: {}", webhook, e);
            false
        }
    }
}
