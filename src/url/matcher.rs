use crate::ConfigError;
use regex::RegexSet;

/// Compiled set of exclude patterns
///
/// A URL is excluded when any pattern matches anywhere in its full string
/// form. Patterns are plain regular expressions; use `(?i)` for
/// case-insensitive matching.
#[derive(Debug, Clone)]
pub struct ExcludeMatcher {
    set: RegexSet,
}

impl ExcludeMatcher {
    /// Compiles the given patterns
    ///
    /// # Examples
    ///
    /// ```
    /// use site_scribe::url::ExcludeMatcher;
    ///
    /// let matcher = ExcludeMatcher::new(&[r"(?i)\.pdf$", "/admin/"]).unwrap();
    /// assert!(matcher.is_excluded("https://example.com/report.PDF"));
    /// assert!(matcher.is_excluded("https://example.com/admin/users"));
    /// assert!(!matcher.is_excluded("https://example.com/about"));
    /// ```
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let set = RegexSet::new(patterns.iter().map(|p| p.as_ref()))
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        Ok(Self { set })
    }

    /// A matcher that excludes nothing
    pub fn empty() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }

    /// Returns true if the URL matches any pattern
    pub fn is_excluded(&self, url: &str) -> bool {
        self.set.is_match(url)
    }

    /// Number of compiled patterns
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}
