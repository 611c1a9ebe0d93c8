use url::Url;

/// Maximum length (in characters) of a sanitized file stem
pub const MAX_FILENAME_LEN: usize = 200;

/// Characters that are invalid in file names on at least one major platform
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Derives a file stem for a page from its URL
///
/// The path and, when present, the query string are sanitized together so
/// that `/list?page=2` and `/list?page=3` land in different files.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_scribe::url::filename_for_url;
///
/// let url = Url::parse("https://example.com/docs/intro/").unwrap();
/// assert_eq!(filename_for_url(&url), "docs_intro");
///
/// let url = Url::parse("https://example.com/").unwrap();
/// assert_eq!(filename_for_url(&url), "index");
/// ```
pub fn filename_for_url(url: &Url) -> String {
    match url.query() {
        Some(query) if !query.is_empty() => sanitize_path(&format!("{}?{}", url.path(), query)),
        _ => sanitize_path(url.path()),
    }
}

/// Sanitizes a URL path into a file stem
///
/// # Rules
///
/// 1. A trailing slash is dropped; an empty path or `/` maps to `index`
/// 2. The leading slash is dropped
/// 3. `< > : " / \ | ? *` and control characters become `_`
/// 4. `..` becomes `_`
/// 5. Runs of underscores collapse to one; leading/trailing underscores are trimmed
/// 6. The result is cut to 200 characters, keeping the extension
/// 7. Anything that ends up empty maps to `index`
pub fn sanitize_path(path: &str) -> String {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);

    if trimmed.is_empty() {
        return "index".to_string();
    }

    let replaced: String = trimmed
        .replace("..", "_")
        .chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let mut collapsed = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }

    let name = truncate_preserving_extension(collapsed.trim_matches('_'), MAX_FILENAME_LEN);

    if name.is_empty() {
        "index".to_string()
    } else {
        name
    }
}

fn truncate_preserving_extension(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let extension = name
        .rfind('.')
        .map(|idx| &name[idx..])
        .filter(|ext| ext.len() > 1 && ext.chars().count() < max_len / 2);

    match extension {
        Some(ext) => {
            let stem_len = max_len - ext.chars().count();
            let stem: String = name.chars().take(stem_len).collect();
            format!("{}{}", stem, ext)
        }
        None => name.chars().take(max_len).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clean(name: &str) {
        for c in INVALID_CHARS {
            assert!(!name.contains(*c), "{:?} contains {:?}", name, c);
        }
        assert!(name.chars().count() <= MAX_FILENAME_LEN);
    }

    #[test]
    fn test_root_is_index() {
        assert_eq!(sanitize_path("/"), "index");
        assert_eq!(sanitize_path(""), "index");
    }

    #[test]
    fn test_query_characters_replaced() {
        let name = sanitize_path("/a/b?c");
        assert_eq!(name, "a_b_c");
        assert_clean(&name);
    }

    #[test]
    fn test_trailing_slash_dropped() {
        assert_eq!(sanitize_path("/docs/intro/"), "docs_intro");
    }

    #[test]
    fn test_invalid_characters() {
        let name = sanitize_path("/we<ird>:na\"me|with*stuff\\here");
        assert_eq!(name, "we_ird_na_me_with_stuff_here");
        assert_clean(&name);
    }

    #[test]
    fn test_collapse_and_trim_underscores() {
        assert_eq!(sanitize_path("/__a___b__/"), "a_b");
        assert_eq!(sanitize_path("/???"), "index");
    }

    #[test]
    fn test_parent_segments_replaced() {
        let name = sanitize_path("/a/../b");
        assert!(!name.contains(".."));
    }

    #[test]
    fn test_keeps_extension() {
        assert_eq!(sanitize_path("/blog/post.html"), "blog_post.html");
    }

    #[test]
    fn test_truncate_preserving_extension() {
        let long = format!("/{}.html", "x".repeat(300));
        let name = sanitize_path(&long);
        assert_eq!(name.chars().count(), MAX_FILENAME_LEN);
        assert!(name.ends_with(".html"));
        assert_clean(&name);
    }

    #[test]
    fn test_truncate_without_extension() {
        let long = format!("/{}", "y".repeat(500));
        let name = sanitize_path(&long);
        assert_eq!(name.chars().count(), MAX_FILENAME_LEN);
    }

    #[test]
    fn test_filename_for_url_with_query() {
        let url = Url::parse("https://example.com/list?page=2").unwrap();
        assert_eq!(filename_for_url(&url), "list_page=2");

        let url = Url::parse("https://example.com/list").unwrap();
        assert_eq!(filename_for_url(&url), "list");
    }
}
