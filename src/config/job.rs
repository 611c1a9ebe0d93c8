use crate::config::types::{Config, CrawlJob, OutputFormat};
use crate::config::validation::{
    validate, validate_concurrency, validate_http_url, validate_max_pages,
};
use crate::url::{extract_domain, normalize_url, ExcludeMatcher};
use crate::ConfigError;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct JobOverrides {
    pub output_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub download_images: bool,
    pub max_pages: Option<usize>,
    pub concurrency: Option<usize>,
    pub webhook: Option<String>,
    pub dry_run: bool,
    pub debug: bool,
}

/// Assembles the immutable [`CrawlJob`] for one run
///
/// The seed must be an absolute http(s) URL with a host; its hostname becomes
/// the origin domain the crawl is confined to. The seed is normalized the
/// same way as discovered links, so it shares their frontier key.
///
/// # Returns
///
/// * `Ok(CrawlJob)` - Validated job
/// * `Err(ConfigError)` - Invalid seed, invalid override, or invalid configuration
pub fn build_job(
    seed: &str,
    config: Config,
    overrides: JobOverrides,
) -> Result<CrawlJob, ConfigError> {
    validate(&config)?;

    let seed = validate_http_url(seed.trim())?;
    let seed =
        normalize_url(seed.as_str()).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
    let origin_domain = extract_domain(&seed)
        .ok_or_else(|| ConfigError::InvalidUrl(format!("Seed URL '{}' has no host", seed)))?;

    let concurrency = overrides.concurrency.unwrap_or(config.crawler.concurrency);
    validate_concurrency(concurrency)?;

    let max_pages = overrides.max_pages.unwrap_or(config.crawler.max_pages);
    validate_max_pages(max_pages)?;

    let webhook = match overrides.webhook.or(config.output.webhook) {
        Some(raw) => Some(validate_http_url(&raw)?),
        None => None,
    };

    let output_dir = overrides
        .output_dir
        .or(config.output.directory)
        .unwrap_or_else(|| default_output_dir(&origin_domain, Utc::now()));

    let exclude = ExcludeMatcher::new(&config.crawler.exclude_patterns)?;

    Ok(CrawlJob {
        seed,
        origin_domain,
        output_dir,
        concurrency,
        timeout: Duration::from_millis(config.crawler.timeout),
        max_retries: config.crawler.max_retries,
        initial_delay: Duration::from_millis(config.crawler.initial_delay),
        max_delay: Duration::from_millis(config.crawler.max_delay),
        max_pages,
        save_state_interval: config.crawler.save_state_interval,
        exclude,
        user_agent: config.request.user_agent,
        headers: config.request.headers,
        remove_selectors: config.content.remove_elements,
        format: overrides.format.unwrap_or(config.output.format),
        include_metadata: config.output.include_metadata,
        include_timestamps: config.output.include_timestamps,
        download_images: overrides.download_images || config.output.download_images,
        image_link_text: config.output.image_link_text,
        markdown: config.markdown,
        webhook,
        dry_run: overrides.dry_run,
        debug: overrides.debug,
    })
}

/// Output directory used when none is configured:
/// `data/tasks/<domain with dots replaced>/<YYYY-MM-DDTHH-MM-SS>`
pub fn default_output_dir(domain: &str, now: DateTime<Utc>) -> PathBuf {
    PathBuf::from("data")
        .join("tasks")
        .join(domain.replace('.', "_"))
        .join(now.format("%Y-%m-%dT%H-%M-%S").to_string())
}
