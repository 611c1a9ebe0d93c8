use crate::config::types::{Config, CrawlerConfig, MarkdownStyle, OutputConfig, RequestConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_request_config(&config.request)?;
    validate_output_config(&config.output)?;
    validate_markdown_style(&config.markdown)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_concurrency(config.concurrency)?;

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0ms".to_string(),
        ));
    }

    if config.max_delay < config.initial_delay {
        return Err(ConfigError::Validation(format!(
            "max_delay ({}ms) must be >= initial_delay ({}ms)",
            config.max_delay, config.initial_delay
        )));
    }

    validate_max_pages(config.max_pages)?;

    if config.save_state_interval < 1 {
        return Err(ConfigError::Validation(
            "save_state_interval must be >= 1".to_string(),
        ));
    }

    for pattern in &config.exclude_patterns {
        validate_exclude_pattern(pattern)?;
    }

    Ok(())
}

/// Validates the concurrency limit (also used for the CLI override)
pub(crate) fn validate_concurrency(concurrency: usize) -> Result<(), ConfigError> {
    if !(1..=100).contains(&concurrency) {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            concurrency
        )));
    }
    Ok(())
}

/// Validates the page cap (also used for the CLI override)
pub(crate) fn validate_max_pages(max_pages: usize) -> Result<(), ConfigError> {
    if max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            max_pages
        )));
    }
    Ok(())
}

/// Validates request configuration
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for name in config.headers.keys() {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::Validation(format!(
                "Invalid header name '{}'",
                name
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if let Some(webhook) = &config.webhook {
        validate_http_url(webhook)?;
    }
    Ok(())
}

/// Validates markdown delimiters and markers
fn validate_markdown_style(style: &MarkdownStyle) -> Result<(), ConfigError> {
    if !matches!(style.em_delimiter.as_str(), "*" | "_") {
        return Err(ConfigError::Validation(format!(
            "em_delimiter must be '*' or '_', got '{}'",
            style.em_delimiter
        )));
    }

    if !matches!(style.strong_delimiter.as_str(), "**" | "__") {
        return Err(ConfigError::Validation(format!(
            "strong_delimiter must be '**' or '__', got '{}'",
            style.strong_delimiter
        )));
    }

    if !matches!(style.bullet_list_marker.as_str(), "-" | "*") {
        return Err(ConfigError::Validation(format!(
            "bullet_list_marker must be '-' or '*', got '{}'",
            style.bullet_list_marker
        )));
    }

    Ok(())
}

/// Validates an exclude pattern compiles as a regular expression
fn validate_exclude_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Exclude pattern cannot be empty".to_string(),
        ));
    }

    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

/// Validates an absolute http(s) URL with a host
pub(crate) fn validate_http_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "URL '{}' must use the http or https scheme",
            raw
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!("URL '{}' has no host", raw)));
    }

    Ok(url)
}
