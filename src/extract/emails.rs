use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Permissive email pattern; not RFC 5322, false positives are accepted
pub const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"));

/// Finds every email-like string in a block of text
///
/// Scans raw text or HTML for all non-overlapping matches of
/// [`EMAIL_PATTERN`] and returns them deduplicated. The set is ordered so that
/// reports come out stable across runs.
///
/// # Examples
///
/// ```
/// use contact_harvest::extract::find_emails;
///
/// let emails = find_emails("Contact: a@example.com or b@example.org, a@example.com");
/// assert_eq!(emails.len(), 2);
/// assert!(emails.contains("b@example.org"));
/// ```
pub fn find_emails(text: &str) -> BTreeSet<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
