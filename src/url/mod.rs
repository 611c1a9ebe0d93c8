//! URL handling module for Site-Scribe
//!
//! This module provides URL normalization, origin checks, exclude-pattern
//! matching, and the URL-to-filename sanitization used by the page writer.

mod domain;
mod matcher;
mod normalize;
mod sanitize;

pub use domain::{extract_domain, is_same_domain};
pub use matcher::ExcludeMatcher;
pub use normalize::{normalize_url, resolve_and_normalize};
pub use sanitize::{filename_for_url, sanitize_path, MAX_FILENAME_LEN};
