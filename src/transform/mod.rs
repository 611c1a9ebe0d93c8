//! Page transformation pipeline
//!
//! Turns one fetched HTML document into converted content, metadata and
//! statistics:
//!
//! 1. Parse and clean (scripts, styles and configured selectors removed)
//! 2. Extract metadata
//! 3. Count content statistics (before images are rewritten)
//! 4. Convert `<body>` to the target format, turning images into links
//!
//! The transform is a pure function of its inputs. Image download happens
//! beforehand (see [`collect_image_sources`] and [`download_images`]) and
//! only the resulting local file names are passed in.

mod clean;
mod images;
mod markdown;
mod metadata;
mod stats;

pub use clean::{serialize_clean_html, Cleaner};
pub use images::{
    collect_image_sources, download_images, image_filename, link_text, ImageRewriter, LocalImages,
};
pub use markdown::MarkdownConverter;
pub use metadata::{extract_metadata, PageMetadata, UNTITLED};
pub use stats::compute_statistics;

use crate::config::{CrawlJob, ImageLinkText, MarkdownStyle, OutputFormat};
use crate::state::ContentStatistics;
use scraper::{ElementRef, Html, Node};
use thiserror::Error;
use url::Url;

/// Errors raised while transforming a page
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("document body is empty")]
    EmptyDocument,
    #[error("markdown conversion failed: {0}")]
    Conversion(String),
}

/// Result of transforming one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedPage {
    pub metadata: PageMetadata,
    /// Markdown for `md`/`json` output, cleaned body HTML for `html`
    pub content: String,
    pub statistics: ContentStatistics,
}

/// Per-crawl transformer with its selectors compiled once
#[derive(Debug, Clone)]
pub struct PageTransformer {
    cleaner: Cleaner,
    format: OutputFormat,
    image_link_text: ImageLinkText,
    markdown: MarkdownStyle,
}

impl PageTransformer {
    pub fn new(job: &CrawlJob) -> Self {
        Self::with_options(
            &job.remove_selectors,
            job.format,
            job.image_link_text,
            job.markdown.clone(),
        )
    }

    pub fn with_options<S: AsRef<str>>(
        remove_selectors: &[S],
        format: OutputFormat,
        image_link_text: ImageLinkText,
        markdown: MarkdownStyle,
    ) -> Self {
        Self {
            cleaner: Cleaner::new(remove_selectors),
            format,
            image_link_text,
            markdown,
        }
    }

    /// Parses `html` and detaches every removed element
    ///
    /// Link and image discovery run on this same cleaned tree, so removed
    /// navigation and tracking elements never reach the frontier or `assets/`.
    pub fn clean_document(&self, html: &str) -> Html {
        let mut document = Html::parse_document(html);
        self.cleaner.clean(&mut document);
        document
    }

    /// Transforms a raw HTML document
    ///
    /// # Arguments
    ///
    /// * `html` - The fetched document
    /// * `page_url` - Final URL of the page; relative image sources resolve against it
    /// * `local_images` - Images already saved under `assets/`, keyed by absolute URL
    ///
    /// # Returns
    ///
    /// * `Ok(TransformedPage)` - Converted content with metadata and statistics
    /// * `Err(TransformError::EmptyDocument)` - Nothing left after cleaning
    pub fn transform(
        &self,
        html: &str,
        page_url: &Url,
        local_images: &LocalImages,
    ) -> Result<TransformedPage, TransformError> {
        let document = self.clean_document(html);

        let body = body_of(&document);
        if is_blank(body) {
            return Err(TransformError::EmptyDocument);
        }

        let metadata = extract_metadata(&document, page_url);
        let mut statistics = compute_statistics(&document);

        let images = ImageRewriter::new(page_url, self.image_link_text, local_images);
        let content = match self.format {
            OutputFormat::Html => serialize_clean_html(body, &images),
            OutputFormat::Markdown | OutputFormat::Json => {
                MarkdownConverter::new(&self.markdown, images)
                    .convert(body)
                    .map_err(|e| TransformError::Conversion(e.to_string()))?
            }
        };
        statistics.markdown_length = content.chars().count();

        Ok(TransformedPage {
            metadata,
            content,
            statistics,
        })
    }
}

fn body_of(document: &Html) -> ElementRef<'_> {
    let root = document.root_element();
    root.children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "body")
        .unwrap_or(root)
}

/// True when the element has neither text nor images
fn is_blank(element: ElementRef) -> bool {
    let has_text = element.text().any(|text| !text.trim().is_empty());
    let has_image = element
        .descendants()
        .any(|node| matches!(node.value(), Node::Element(e) if e.name() == "img"));
    !has_text && !has_image
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Getting Started</title>
    <meta name="description" content="How to begin">
    <style>body { color: red; }</style>
</head>
<body>
    <nav><a href="/">Home</a> <a href="/docs">Docs</a></nav>
    <main>
        <h1>Getting Started</h1>
        <p style="margin:0">Install the <strong>tool</strong> first.</p>
        <img src="/img/setup.png" alt="Setup screen">
        <ul><li>Step one</li><li>Step two</li></ul>
    </main>
    <footer>Copyright</footer>
    <script>track();</script>
</body>
</html>"#;

    fn page_url() -> Url {
        Url::parse("https://example.com/start").unwrap()
    }

    fn transformer(format: OutputFormat) -> PageTransformer {
        PageTransformer::with_options(
            &["nav", "footer"],
            format,
            ImageLinkText::Alt,
            MarkdownStyle::default(),
        )
    }

    #[test]
    fn test_markdown_transform() {
        let page = transformer(OutputFormat::Markdown)
            .transform(PAGE, &page_url(), &LocalImages::new())
            .unwrap();

        assert_eq!(page.metadata.title, "Getting Started");
        assert_eq!(page.metadata.description, "How to begin");
        assert!(page.content.starts_with("# Getting Started\n"));
        assert!(page.content.contains("Install the **tool** first."));
        assert!(page
            .content
            .contains("[Setup screen](https://example.com/img/setup.png)"));
        assert!(page.content.lines().any(|l| l.starts_with('-') && l.ends_with("Step two")));
        assert!(!page.content.contains("Home"));
        assert!(!page.content.contains("Copyright"));
        assert!(!page.content.contains("track"));
    }

    #[test]
    fn test_statistics() {
        let page = transformer(OutputFormat::Markdown)
            .transform(PAGE, &page_url(), &LocalImages::new())
            .unwrap();

        assert_eq!(page.statistics.images, 1);
        // The two navigation links were removed with <nav>
        assert_eq!(page.statistics.links, 0);
        assert_eq!(page.statistics.headings, 1);
        assert_eq!(page.statistics.paragraphs, 1);
        assert_eq!(page.statistics.lists, 1);
        assert_eq!(page.statistics.markdown_length, page.content.chars().count());
        assert!(page.statistics.words > 0);
    }

    #[test]
    fn test_html_transform_drops_styles() {
        let page = transformer(OutputFormat::Html)
            .transform(PAGE, &page_url(), &LocalImages::new())
            .unwrap();

        assert!(page.content.contains("<h1>Getting Started</h1>"));
        assert!(page.content.contains("<p>Install the <strong>tool</strong> first.</p>"));
        assert!(page
            .content
            .contains(r#"<a href="https://example.com/img/setup.png">Setup screen</a>"#));
        assert!(!page.content.contains("style="));
        assert!(!page.content.contains("<img"));
    }

    #[test]
    fn test_local_image_targets() {
        let mut local = LocalImages::new();
        local.insert(
            "https://example.com/img/setup.png".to_string(),
            "0123abcd-setup.png".to_string(),
        );
        let page = transformer(OutputFormat::Markdown)
            .transform(PAGE, &page_url(), &local)
            .unwrap();

        assert!(page.content.contains("[Setup screen](./assets/0123abcd-setup.png)"));
    }

    #[test]
    fn test_transform_is_deterministic() {
        for format in [OutputFormat::Markdown, OutputFormat::Html, OutputFormat::Json] {
            let t = transformer(format);
            let a = t.transform(PAGE, &page_url(), &LocalImages::new()).unwrap();
            let b = t.transform(PAGE, &page_url(), &LocalImages::new()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_empty_document() {
        let t = transformer(OutputFormat::Markdown);
        for html in [
            "",
            "<html><body>   </body></html>",
            "<html><body><nav>only nav</nav><script>x()</script></body></html>",
        ] {
            assert_eq!(
                t.transform(html, &page_url(), &LocalImages::new()),
                Err(TransformError::EmptyDocument)
            );
        }
    }

    #[test]
    fn test_clean_document_detaches_removed_elements() {
        let document = transformer(OutputFormat::Markdown).clean_document(PAGE);
        let links = Selector::parse("a").unwrap();
        assert_eq!(document.root_element().select(&links).count(), 0);
        let items = Selector::parse("li").unwrap();
        assert_eq!(document.root_element().select(&items).count(), 2);
    }

    #[test]
    fn test_untitled_page() {
        let page = transformer(OutputFormat::Markdown)
            .transform(
                "<html><body><p>text</p></body></html>",
                &page_url(),
                &LocalImages::new(),
            )
            .unwrap();
        assert_eq!(page.metadata.title, UNTITLED);
    }
}
