use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_scribe::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when `url` is on exactly the given origin hostname
///
/// Ports and schemes are ignored; subdomains are different hosts.
pub fn is_same_domain(url: &Url, origin_domain: &str) -> bool {
    url.host_str()
        .map_or(false, |host| host.eq_ignore_ascii_case(origin_domain))
}
