use crate::UrlError;

/// Schemes accepted as already present
const KNOWN_SCHEMES: &[&str] = &["http://", "https://"];

/// Normalizes a user-supplied site address into its canonical form
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject if nothing remains
/// 2. Keep the address as-is when it already starts with `http://` or
///    `https://` (case-insensitive)
/// 3. Otherwise prepend `https://`
///
/// The result is not parsed here. Addresses that turn out to be malformed are
/// reported on that site's result instead of rejecting the whole batch.
///
/// # Examples
///
/// ```
/// use contact_harvest::url::normalize_url;
///
/// assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
/// assert_eq!(normalize_url(" http://example.com/ ").unwrap(), "http://example.com/");
/// ```
pub fn normalize_url(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    if has_scheme(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{}", trimmed))
    }
}

/// Returns true if the address already carries an HTTP(S) scheme
fn has_scheme(url: &str) -> bool {
    KNOWN_SCHEMES.iter().any(|scheme| {
        url.get(..scheme.len())
            .map(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .unwrap_or(false)
    })
}
