//! Per-page work: fetch, discover, download images, transform, write
//!
//! A pipeline run never touches crawl state. It receives a URL and a delay
//! snapshot and returns a [`PageOutcome`] for the scheduler to apply.

use crate::config::{CrawlJob, OutputFormat};
use crate::crawler::{extract_links, FetchError, PageFetcher};
use crate::output::{render_page, write_page, OutputLayout};
use crate::state::{DownloadedImage, PageRecord};
use crate::transform::{collect_image_sources, download_images, LocalImages, PageTransformer};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// What happened to one URL
#[derive(Debug)]
pub enum PageOutcome {
    /// The page file was written
    Written {
        url: Url,
        record: PageRecord,
        links: Vec<Url>,
        images: Vec<DownloadedImage>,
    },
    /// The fetch failed; the scheduler decides whether to retry
    FetchFailed { url: Url, error: FetchError },
    /// Fetched, but could not be converted or written
    Rejected {
        url: Url,
        reason: String,
        links: Vec<Url>,
    },
}

impl PageOutcome {
    pub fn url(&self) -> &Url {
        match self {
            Self::Written { url, .. }
            | Self::FetchFailed { url, .. }
            | Self::Rejected { url, .. } => url,
        }
    }
}

/// Immutable inputs shared by all workers
pub struct PagePipeline {
    fetcher: Arc<dyn PageFetcher>,
    transformer: PageTransformer,
    format: OutputFormat,
    include_metadata: bool,
    include_timestamps: bool,
    download_images: bool,
    pages_dir: PathBuf,
    assets_dir: PathBuf,
}

impl PagePipeline {
    pub fn new(job: &CrawlJob, fetcher: Arc<dyn PageFetcher>, layout: &OutputLayout) -> Self {
        Self {
            fetcher,
            transformer: PageTransformer::new(job),
            format: job.format,
            include_metadata: job.include_metadata,
            include_timestamps: job.include_timestamps,
            download_images: job.download_images,
            pages_dir: layout.pages_dir(),
            assets_dir: layout.assets_dir(),
        }
    }

    /// Processes one URL after waiting `delay`, writing it to `pages/<filename>`
    pub async fn process(
        self: Arc<Self>,
        url: Url,
        filename: String,
        delay: Duration,
    ) -> PageOutcome {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::debug!("Fetching {}", url);
        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(error) => return PageOutcome::FetchFailed { url, error },
        };

        let (links, image_sources) = discover(
            &self.transformer,
            &page.body,
            &page.final_url,
            self.download_images,
        );

        let images = if image_sources.is_empty() {
            Vec::new()
        } else {
            download_images(self.fetcher.as_ref(), &image_sources, &self.assets_dir).await
        };
        let local: LocalImages = images
            .iter()
            .map(|image| (image.original.clone(), image.local.clone()))
            .collect();

        let transformed = match self.transformer.transform(&page.body, &page.final_url, &local) {
            Ok(transformed) => transformed,
            Err(e) => {
                return PageOutcome::Rejected {
                    url,
                    reason: e.to_string(),
                    links,
                }
            }
        };

        let scraped_at = Utc::now();
        let written = render_page(
            &transformed,
            self.format,
            self.include_metadata,
            self.include_timestamps,
            scraped_at,
        )
        .and_then(|contents| write_page(&self.pages_dir, &filename, &contents));

        if let Err(e) = written {
            return PageOutcome::Rejected {
                url,
                reason: e.to_string(),
                links,
            };
        }

        let record = PageRecord {
            url: url.to_string(),
            title: transformed.metadata.title,
            description: transformed.metadata.description,
            filename,
            statistics: transformed.statistics,
            scraped_at,
        };

        PageOutcome::Written {
            url,
            record,
            links,
            images,
        }
    }
}

/// Links and image sources of the cleaned document
fn discover(
    transformer: &PageTransformer,
    body: &str,
    base_url: &Url,
    with_images: bool,
) -> (Vec<Url>, Vec<Url>) {
    let document = transformer.clean_document(body);
    let links = extract_links(&document, base_url);
    let images = if with_images {
        collect_image_sources(&document, base_url)
    } else {
        Vec::new()
    };
    (links, images)
}
