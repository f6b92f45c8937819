use url::Url;

/// Extracts the host of a site address for display in reports
///
/// Falls back to the address itself when it cannot be parsed or has no host,
/// so every result row still has something to show.
///
/// # Examples
///
/// ```
/// use contact_harvest::url::report_domain;
///
/// assert_eq!(report_domain("https://Example.com/contact"), "example.com");
/// assert_eq!(report_domain("not a url"), "not a url");
/// ```
pub fn report_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_else(|| url.to_string())
}
