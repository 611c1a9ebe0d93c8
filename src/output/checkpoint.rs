use crate::output::{write_atomic, OutputError, OutputResult};
use crate::state::{DownloadedImage, PageFailure, PageRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Resumable crawl state, stored as `state.json`
///
/// Missing keys deserialize to their defaults so checkpoints written by
/// older runs still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Checkpoint {
    /// URLs with a terminal outcome
    pub visited: Vec<String>,
    /// URLs still to crawl, in-flight ones first
    pub to_visit: Vec<String>,
    pub sitemap: Vec<PageRecord>,
    pub total_pages: usize,
    pub successful_pages: usize,
    pub failed_pages: usize,
    pub downloaded_images: Vec<DownloadedImage>,
    pub unique_urls_discovered: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub failures: Vec<PageFailure>,
}

impl Checkpoint {
    /// Loads a checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Some(checkpoint))` - A checkpoint was found
    /// * `Ok(None)` - No checkpoint exists at `path`
    /// * `Err(OutputError)` - The file exists but could not be read or parsed
    pub fn load(path: &Path) -> OutputResult<Option<Self>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(OutputError::io(path, e)),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Saves the checkpoint atomically
    pub fn save(&self, path: &Path) -> OutputResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }
}
