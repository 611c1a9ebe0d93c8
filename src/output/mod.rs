//! Output module for everything a crawl writes to disk
//!
//! This module handles:
//! - Rendering and writing one file per page under `pages/`
//! - Generating the `sitemap.md` index of the crawl
//! - Saving and loading the `state.json` checkpoint
//!
//! Files that must never be observed half-written (the checkpoint and the
//! sitemap) go through [`write_atomic`].

mod checkpoint;
mod pages;
mod sitemap;

pub use checkpoint::Checkpoint;
pub use pages::{disambiguated_filename, page_filename, render_page, write_page};
pub use sitemap::{format_sitemap, write_sitemap, SitemapContext};

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl OutputError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Paths inside a crawl's output directory
///
/// ```text
/// <root>/
/// ├── pages/        one file per page
/// ├── assets/       downloaded images
/// ├── sitemap.md
/// └── state.json    resumable checkpoint
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.root.join("sitemap.md")
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// Creates the root, `pages/` and `assets/` directories
    pub fn create(&self) -> OutputResult<()> {
        for dir in [self.root.clone(), self.pages_dir(), self.assets_dir()] {
            fs::create_dir_all(&dir).map_err(|e| OutputError::io(&dir, e))?;
        }
        Ok(())
    }
}

/// Writes `contents` to `path` through a sibling temp file and a rename
///
/// A crash leaves either the previous file or the new one, never a torn
/// mix of both.
pub fn write_atomic(path: &Path, contents: &[u8]) -> OutputResult<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = File::create(&tmp_path).map_err(|e| OutputError::io(&tmp_path, e))?;
    file.write_all(contents)
        .and_then(|_| file.sync_all())
        .map_err(|e| OutputError::io(&tmp_path, e))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| OutputError::io(path, e))
}
