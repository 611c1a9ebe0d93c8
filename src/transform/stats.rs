use crate::state::ContentStatistics;
use scraper::{Html, Selector};

/// Counts content statistics over a cleaned document
///
/// Only nodes still attached under the root element are counted, so
/// elements detached by the cleaner never contribute. Text nodes are joined
/// with a space before words are split. `markdown_length` is left at zero;
/// the transformer fills it in once the content is rendered.
pub fn compute_statistics(document: &Html) -> ContentStatistics {
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");

    ContentStatistics {
        words: text.split_whitespace().count(),
        characters: text.chars().count(),
        images: count(document, "img"),
        links: count(document, "a"),
        headings: count(document, "h1, h2, h3, h4, h5, h6"),
        paragraphs: count(document, "p"),
        lists: count(document, "ul, ol"),
        tables: count(document, "table"),
        markdown_length: 0,
    }
}

fn count(document: &Html, selector: &str) -> usize {
    Selector::parse(selector)
        .map(|selector| document.root_element().select(&selector).count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Cleaner;

    #[test]
    fn test_counts() {
        let doc = Html::parse_document(
            r#"<html><body>
                <h1>Title</h1><h2>Sub</h2>
                <p>one two three</p><p>four <a href="/x">five</a></p>
                <ul><li>a</li></ul><ol><li>b</li></ol>
                <table><tr><td>c</td></tr></table>
                <img src="/i.png">
            </body></html>"#,
        );
        let stats = compute_statistics(&doc);

        assert_eq!(stats.headings, 2);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.links, 1);
        assert_eq!(stats.lists, 2);
        assert_eq!(stats.tables, 1);
        assert_eq!(stats.images, 1);
        assert_eq!(stats.words, 10);
    }

    #[test]
    fn test_adjacent_text_nodes_are_separate_words() {
        let doc = Html::parse_document("<html><body><h1>Title</h1><h2>Sub</h2></body></html>");
        assert_eq!(compute_statistics(&doc).words, 2);
    }

    #[test]
    fn test_detached_elements_not_counted() {
        let mut doc = Html::parse_document(
            r#"<html><body>
                <nav><a href="/x">x</a><h2>Menu</h2><img src="/t.gif"></nav>
                <p>Body</p>
            </body></html>"#,
        );
        Cleaner::new(&["nav"]).clean(&mut doc);
        let stats = compute_statistics(&doc);

        assert_eq!(stats.links, 0);
        assert_eq!(stats.headings, 0);
        assert_eq!(stats.images, 0);
        assert_eq!(stats.paragraphs, 1);
        assert_eq!(stats.words, 1);
    }

    #[test]
    fn test_empty_document() {
        let stats = compute_statistics(&Html::parse_document(""));
        assert_eq!(stats.words, 0);
        assert_eq!(stats.characters, 0);
        assert_eq!(stats, ContentStatistics::default());
    }
}
