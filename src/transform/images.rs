//! Image handling for the page transformer
//!
//! `<img>` elements never survive conversion as images: each one becomes an
//! inline link whose text follows the configured [`ImageLinkText`] policy
//! and whose target is either the downloaded copy under `assets/` or the
//! absolute remote URL.

use crate::config::ImageLinkText;
use crate::crawler::PageFetcher;
use crate::state::DownloadedImage;
use crate::url::sanitize_path;
use scraper::node::Element;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use url::Url;

/// Name used when an image URL has no usable last path segment
const FALLBACK_IMAGE_NAME: &str = "image.jpg";

/// Absolute image URL to file name under `assets/`
pub type LocalImages = HashMap<String, String>;

/// Collects the absolute http(s) URLs of every `<img src>` in the document
///
/// Sources are deduplicated, keeping document order. `data:` URIs and
/// anything that does not resolve are skipped.
pub fn collect_image_sources(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .root_element()
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(|src| resolve_src(src, base_url))
        .filter(|url| seen.insert(url.to_string()))
        .collect()
}

/// File name under `assets/` for an image URL
///
/// The sanitized last path segment is prefixed with a short hash of the full
/// URL so that `/a/logo.png` and `/b/logo.png` do not overwrite each other.
pub fn image_filename(url: &Url) -> String {
    let basename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(sanitize_path)
        .unwrap_or_else(|| FALLBACK_IMAGE_NAME.to_string());

    let digest = hex::encode(Sha256::digest(url.as_str().as_bytes()));
    format!("{}-{}", &digest[..8], basename)
}

/// Downloads images into `assets_dir`
///
/// Images whose file already exists are not fetched again. Failures are
/// logged and skipped; the caller links those images remotely.
///
/// # Returns
///
/// One record per image available locally after the call
pub async fn download_images(
    fetcher: &dyn PageFetcher,
    sources: &[Url],
    assets_dir: &Path,
) -> Vec<DownloadedImage> {
    let mut downloaded = Vec::with_capacity(sources.len());

    for url in sources {
        let local = image_filename(url);
        let path = assets_dir.join(&local);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let bytes = match fetcher.fetch_bytes(url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!("Image download failed for {}: {}", url, e);
                    continue;
                }
            };

            if let Err(e) = tokio::fs::write(&path, &bytes).await {
                tracing::warn!("Failed to save image {}: {}", path.display(), e);
                continue;
            }
        }

        downloaded.push(DownloadedImage {
            original: url.to_string(),
            local,
        });
    }

    downloaded
}

/// Turns `<img>` elements into link text and targets during serialization
#[derive(Debug, Clone, Copy)]
pub struct ImageRewriter<'a> {
    base_url: &'a Url,
    policy: ImageLinkText,
    local: &'a LocalImages,
}

impl<'a> ImageRewriter<'a> {
    pub fn new(base_url: &'a Url, policy: ImageLinkText, local: &'a LocalImages) -> Self {
        Self {
            base_url,
            policy,
            local,
        }
    }

    /// Returns `(link text, target)` for an `<img>`, or None when it has no usable source
    pub fn rewrite(&self, img: &Element) -> Option<(String, String)> {
        let src = img.attr("src")?.trim();
        let absolute = resolve_src(src, self.base_url)?;

        let target = match self.local.get(absolute.as_str()) {
            Some(local) => format!("./assets/{}", local),
            None => absolute.to_string(),
        };

        let text = link_text(
            self.policy,
            img.attr("alt").unwrap_or(""),
            img.attr("title").unwrap_or(""),
            src,
            &absolute,
        );

        Some((text, target))
    }
}

/// Chooses link text for an image
///
/// | Policy | Fallback chain |
/// |--------|----------------|
/// | `alt` | alt, title, filename, "Image" |
/// | `title` | title, alt, filename, "Image" |
/// | `filename` | filename, "Image" |
/// | `url` | absolute URL |
pub fn link_text(
    policy: ImageLinkText,
    alt: &str,
    title: &str,
    src: &str,
    absolute: &Url,
) -> String {
    let filename = src.rsplit('/').next().unwrap_or("");
    let candidates = match policy {
        ImageLinkText::Alt => [alt, title, filename],
        ImageLinkText::Title => [title, alt, filename],
        ImageLinkText::Filename => [filename, "", ""],
        ImageLinkText::Url => return absolute.to_string(),
    };

    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or("Image")
        .to_string()
}

fn resolve_src(src: &str, base_url: &Url) -> Option<Url> {
    let src = src.trim();
    if src.is_empty() || src.to_ascii_lowercase().starts_with("data:") {
        return None;
    }

    base_url
        .join(src)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
