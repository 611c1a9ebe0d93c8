//! Configuration module for Site-Scribe
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and assembling it with the seed URL and command-line
//! overrides into the immutable [`CrawlJob`].
//!
//! # Example
//!
//! ```no_run
//! use site_scribe::config::{build_job, load_config, JobOverrides};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! let job = build_job("https://example.com/", config, JobOverrides::default()).unwrap();
//! println!("Crawler will fetch at most {} pages", job.max_pages);
//! ```

mod job;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CodeBlockStyle, Config, ContentConfig, CrawlJob, CrawlerConfig, HeadingStyle, ImageLinkText,
    MarkdownStyle, OutputConfig, OutputFormat, RequestConfig,
};

pub use job::{build_job, default_output_dir, JobOverrides};
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
