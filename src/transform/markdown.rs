//! HTML to Markdown conversion
//!
//! Conversion runs through [`htmd`]. The cleaned body is first serialized
//! with every `<img>` already rewritten into an `<a>` (see
//! [`serialize_clean_html`]), so images reach the converter as plain links.
//! Bullet marker and code-block style map onto htmd's options. Headings,
//! emphasis, horizontal rules and tables go through custom handlers so the
//! configured delimiters and heading style apply.

use crate::config::{CodeBlockStyle, HeadingStyle, MarkdownStyle};
use crate::transform::clean::serialize_clean_html;
use crate::transform::images::ImageRewriter;
use htmd::options::{BulletListMarker, Options};
use htmd::{Element, HtmlToMarkdown};
use scraper::ElementRef;

/// Elements dropped with their content
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "iframe", "svg", "canvas", "object",
    "embed", "select", "option", "button", "input", "textarea",
];

/// Separators between table cells and rows while a table is assembled
const CELL_END: char = '\u{1f}';
const ROW_END: char = '\u{1e}';

/// Converts cleaned HTML to Markdown with the configured style
pub struct MarkdownConverter<'a> {
    style: &'a MarkdownStyle,
    images: ImageRewriter<'a>,
}

impl<'a> MarkdownConverter<'a> {
    pub fn new(style: &'a MarkdownStyle, images: ImageRewriter<'a>) -> Self {
        Self { style, images }
    }

    /// Converts the children of `root` (normally `<body>`)
    pub fn convert(&self, root: ElementRef) -> std::io::Result<String> {
        let html = serialize_clean_html(root, &self.images);
        let markdown = build_converter(self.style).convert(&html)?;
        Ok(markdown.trim().to_string())
    }
}

fn build_converter(style: &MarkdownStyle) -> HtmlToMarkdown {
    let options = Options {
        bullet_list_marker: match style.bullet_list_marker.as_str() {
            "*" => BulletListMarker::Asterisk,
            _ => BulletListMarker::Dash,
        },
        code_block_style: match style.code_block_style {
            CodeBlockStyle::Fenced => htmd::options::CodeBlockStyle::Fenced,
            CodeBlockStyle::Indented => htmd::options::CodeBlockStyle::Indented,
        },
        ..Default::default()
    };

    let heading_style = style.heading_style;
    let em = style.em_delimiter.clone();
    let strong = style.strong_delimiter.clone();

    HtmlToMarkdown::builder()
        .options(options)
        .skip_tags(SKIPPED_TAGS.to_vec())
        .add_handler(vec!["h1", "h2", "h3", "h4", "h5", "h6"], move |element: Element| {
            Some(heading(element.tag, element.content, heading_style))
        })
        .add_handler(vec!["em", "i"], move |element: Element| {
            Some(wrap(element.content, &em))
        })
        .add_handler(vec!["strong", "b"], move |element: Element| {
            Some(wrap(element.content, &strong))
        })
        .add_handler(vec!["hr"], |_: Element| Some("\n\n* * *\n\n".to_string()))
        .add_handler(vec!["th", "td"], |element: Element| {
            Some(format!("{}{}", table_cell(element.content), CELL_END))
        })
        .add_handler(vec!["tr"], |element: Element| {
            Some(format!("{}{}", element.content, ROW_END))
        })
        .add_handler(vec!["table"], |element: Element| Some(table(element.content)))
        .build()
}

fn heading(tag: &str, content: &str, style: HeadingStyle) -> String {
    let level = tag
        .strip_prefix('h')
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(1);
    let text = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return String::new();
    }

    match (style, level) {
        (HeadingStyle::Setext, 1 | 2) => {
            let underline = if level == 1 { "=" } else { "-" };
            let width = text.chars().count().max(3);
            format!("\n\n{}\n{}\n\n", text, underline.repeat(width))
        }
        _ => format!("\n\n{} {}\n\n", "#".repeat(level), text),
    }
}

fn wrap(content: &str, delimiter: &str) -> String {
    let text = content.trim();
    if text.is_empty() {
        return content.to_string();
    }
    let lead = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{}{}{}{}{}", lead, delimiter, text, delimiter, trail)
}

fn table_cell(content: &str) -> String {
    content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

/// Assembles rows of `CELL_END`-terminated cells into a pipe table
///
/// The first row becomes the header. Short rows are padded.
fn table(content: &str) -> String {
    let rows: Vec<Vec<&str>> = content
        .split(ROW_END)
        .map(|row| {
            let mut cells: Vec<&str> = row.split(CELL_END).map(str::trim).collect();
            // Text after the last cell terminator is inter-row whitespace
            cells.pop();
            cells
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        let mut cells = row.clone();
        cells.resize(columns, "");
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            lines.push(format!("| {} |", vec!["---"; columns].join(" | ")));
        }
    }

    format!("\n\n{}\n\n", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageLinkText;
    use crate::transform::images::LocalImages;
    use scraper::{Html, Selector};
    use url::Url;

    fn convert_with(html: &str, style: &MarkdownStyle) -> String {
        let document = Html::parse_document(html);
        let body = document
            .select(&Selector::parse("body").unwrap())
            .next()
            .unwrap();
        let base = Url::parse("https://example.com/page").unwrap();
        let local = LocalImages::new();
        let images = ImageRewriter::new(&base, ImageLinkText::Alt, &local);
        MarkdownConverter::new(style, images).convert(body).unwrap()
    }

    fn convert(html: &str) -> String {
        convert_with(html, &MarkdownStyle::default())
    }

    #[test]
    fn test_headings_atx() {
        let md = convert("<h1>Title</h1><h3>Sub</h3>");
        assert!(md.starts_with("# Title"));
        assert!(md.contains("\n### Sub"));
    }

    #[test]
    fn test_headings_setext() {
        let style = MarkdownStyle {
            heading_style: HeadingStyle::Setext,
            ..Default::default()
        };
        let md = convert_with("<h1>Title</h1><h2>Section</h2><h3>Deep</h3>", &style);
        assert!(md.contains("Title\n====="));
        assert!(md.contains("Section\n-------"));
        assert!(md.contains("### Deep"));
    }

    #[test]
    fn test_emphasis_delimiters() {
        let md = convert("<p>Hello <strong>bold</strong> and <em>soft</em> words.</p>");
        assert!(md.contains("Hello **bold** and *soft* words."));

        let style = MarkdownStyle {
            em_delimiter: "_".to_string(),
            strong_delimiter: "__".to_string(),
            ..Default::default()
        };
        let md = convert_with("<p><b>a</b> <i>b</i></p>", &style);
        assert!(md.contains("__a__"));
        assert!(md.contains("_b_"));
    }

    #[test]
    fn test_images_become_links() {
        assert_eq!(
            convert(r#"<p><img src="/a.png" alt="Alt text"></p>"#),
            "[Alt text](https://example.com/a.png)"
        );
    }

    #[test]
    fn test_code_block_styles() {
        let html = "<p>x</p><pre><code>a\nb</code></pre>";
        let fenced = convert(html);
        assert!(fenced.contains("```"));
        assert!(fenced.contains("a\nb"));

        let style = MarkdownStyle {
            code_block_style: CodeBlockStyle::Indented,
            ..Default::default()
        };
        let indented = convert_with(html, &style);
        assert!(!indented.contains("```"));
        assert!(indented.contains("    a\n    b"));
    }

    #[test]
    fn test_bullet_marker() {
        let dash = convert("<ul><li>One</li><li>Two</li></ul>");
        assert!(dash.lines().any(|l| l.starts_with('-') && l.ends_with("One")));

        let style = MarkdownStyle {
            bullet_list_marker: "*".to_string(),
            ..Default::default()
        };
        let star = convert_with("<ul><li>One</li></ul>", &style);
        assert!(star.lines().any(|l| l.starts_with('*') && l.ends_with("One")));
    }

    #[test]
    fn test_horizontal_rule() {
        let md = convert("<p>Top</p><hr><p>Bottom</p>");
        let lines: Vec<&str> = md.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines, vec!["Top", "* * *", "Bottom"]);
    }

    #[test]
    fn test_table() {
        let html = "<table><thead><tr><th>Name</th><th>Age</th></tr></thead>\
                    <tbody><tr><td>Ann</td><td>30</td></tr><tr><td>Bob</td></tr></tbody></table>";
        assert!(convert(html).contains("| Name | Age |\n| --- | --- |\n| Ann | 30 |\n| Bob |  |"));
    }

    #[test]
    fn test_table_assembly() {
        let raw = format!(
            "\n  A{c} B{c}{r}\n  1{c}{r}",
            c = CELL_END,
            r = ROW_END
        );
        assert_eq!(table(&raw), "\n\n| A | B |\n| --- | --- |\n| 1 |  |\n\n");
        assert_eq!(table("  "), "");
        assert_eq!(table_cell(" Bo|b\n x "), "Bo\\|b x");
    }

    #[test]
    fn test_heading_collapses_whitespace() {
        assert_eq!(heading("h2", "  Two\n words ", HeadingStyle::Atx), "\n\n## Two words\n\n");
        assert_eq!(heading("h1", "   ", HeadingStyle::Setext), "");
    }
}
