use crate::transform::images::ImageRewriter;
use scraper::{ElementRef, Html, Node, Selector};
use std::fmt::Write;

/// Elements that never carry page content
const ALWAYS_REMOVED: &[&str] = &["script", "style", "noscript", "template"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Removes unwanted elements from a parsed document
///
/// Selectors are compiled once per crawl. A selector that fails to parse is
/// logged and skipped rather than failing the run. Inline `style`
/// attributes are not touched here; the serializers drop them on output.
#[derive(Debug, Clone)]
pub struct Cleaner {
    selectors: Vec<Selector>,
}

impl Cleaner {
    /// Compiles the built-in removals plus the configured selectors
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Self {
        let mut compiled = Vec::with_capacity(ALWAYS_REMOVED.len() + selectors.len());

        for raw in ALWAYS_REMOVED
            .iter()
            .copied()
            .chain(selectors.iter().map(AsRef::as_ref))
        {
            match Selector::parse(raw) {
                Ok(selector) => compiled.push(selector),
                Err(e) => tracing::warn!("Skipping invalid removal selector '{}': {:?}", raw, e),
            }
        }

        Self {
            selectors: compiled,
        }
    }

    pub fn selector_count(&self) -> usize {
        self.selectors.len()
    }

    /// Detaches every matching element; returns how many were removed
    pub fn clean(&self, document: &mut Html) -> usize {
        let mut removed = 0;

        for selector in &self.selectors {
            let ids: Vec<_> = document
                .root_element()
                .select(selector)
                .map(|element| element.id())
                .collect();
            for id in ids {
                if let Some(mut node) = document.tree.get_mut(id) {
                    node.detach();
                    removed += 1;
                }
            }
        }

        removed
    }
}

/// Serializes the children of `root` as HTML
///
/// Inline `style` attributes, comments and doctypes are dropped, every
/// `<img>` becomes an `<a>` pointing at the image target, and attributes are
/// written in name order so output does not depend on parse order.
pub fn serialize_clean_html(root: ElementRef, images: &ImageRewriter) -> String {
    let mut out = String::new();
    write_children(root, images, &mut out);
    out.trim().to_string()
}

fn write_children(element: ElementRef, images: &ImageRewriter, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_html(text, false)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, images, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef, images: &ImageRewriter, out: &mut String) {
    let value = element.value();
    let name = value.name();

    if name == "img" {
        if let Some((text, target)) = images.rewrite(value) {
            let _ = write!(
                out,
                "<a href=\"{}\">{}</a>",
                escape_html(&target, true),
                escape_html(&text, false)
            );
        }
        return;
    }

    out.push('<');
    out.push_str(name);
    let mut attrs: Vec<(&str, &str)> = value
        .attrs()
        .filter(|(attr, _)| !attr.eq_ignore_ascii_case("style"))
        .collect();
    attrs.sort_unstable();
    for (attr, attr_value) in attrs {
        let _ = write!(out, " {}=\"{}\"", attr, escape_html(attr_value, true));
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(element, images, out);
    let _ = write!(out, "</{}>", name);
}

fn escape_html(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_html(document: &Html) -> String {
        let body = Selector::parse("body").unwrap();
        document.select(&body).next().unwrap().inner_html()
    }

    #[test]
    fn test_removes_scripts_and_styles() {
        let mut doc = Html::parse_document(
            "<html><head><style>p{}</style></head>\
             <body><script>x()</script><p>Keep</p></body></html>",
        );
        Cleaner::new::<&str>(&[]).clean(&mut doc);

        let html = doc.root_element().html();
        assert!(!html.contains("<script"));
        assert!(!html.contains("<style"));
        assert!(html.contains("Keep"));
    }

    #[test]
    fn test_removes_configured_selectors() {
        let mut doc = Html::parse_document(
            r#"<html><body><nav>Menu</nav><div class="sidebar">Side</div>
               <main><p>Body</p></main><footer>Foot</footer></body></html>"#,
        );
        let removed = Cleaner::new(&["nav", ".sidebar", "footer"]).clean(&mut doc);

        assert_eq!(removed, 3);
        let body = body_html(&doc);
        assert!(!body.contains("Menu"));
        assert!(!body.contains("Side"));
        assert!(!body.contains("Foot"));
        assert!(body.contains("Body"));
    }

    #[test]
    fn test_nested_matches() {
        let mut doc = Html::parse_document(
            r#"<html><body><div class="ad"><div class="ad">inner</div></div><p>ok</p></body>"#,
        );
        Cleaner::new(&[".ad"]).clean(&mut doc);
        assert!(!body_html(&doc).contains("inner"));
    }

    #[test]
    fn test_serialize_drops_styles_and_rewrites_images() {
        let doc = Html::parse_document(
            concat!(
                r#"<html><body><p style="color:red" class="lead">A &amp; B</p>"#,
                r#"<img src="/x.png" alt="X"><br></body></html>"#,
            ),
        );
        let body = doc.select(&Selector::parse("body").unwrap()).next().unwrap();
        let base = url::Url::parse("https://example.com/").unwrap();
        let local = crate::transform::images::LocalImages::new();
        let images = ImageRewriter::new(&base, crate::config::ImageLinkText::Alt, &local);

        assert_eq!(
            serialize_clean_html(body, &images),
            r#"<p class="lead">A &amp; B</p><a href="https://example.com/x.png">X</a><br>"#
        );
    }

    #[test]
    fn test_invalid_selector_skipped() {
        let cleaner = Cleaner::new(&["nav", "[[broken", "footer"]);
        assert_eq!(cleaner.selector_count(), ALWAYS_REMOVED.len() + 2);
    }
}
