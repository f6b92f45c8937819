//! Candidate page expansion
//!
//! Every site is probed at its base URL and then at a fixed catalog of
//! sub-paths where contact details usually live.

use crate::config::DEFAULT_CANDIDATE_PAGES;

/// A single page to probe on a site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePage {
    /// Absolute URL of the page
    pub url: String,

    /// True for the site's base URL, false for catalog sub-pages
    pub primary: bool,
}

/// Expands a base URL into the ordered list of pages to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePages {
    suffixes: Vec<String>,
}

impl CandidatePages {
    /// Creates an expander for the given path suffixes
    ///
    /// Leading slashes are stripped and empty entries dropped.
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim().trim_start_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { suffixes }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Number of pages produced per site (base plus catalog)
    pub fn pages_per_site(&self) -> usize {
        self.suffixes.len() + 1
    }

    /// Produces the base URL followed by one URL per catalog suffix
    ///
    /// # Examples
    ///
    /// ```
    /// use contact_harvest::crawler::CandidatePages;
    ///
    /// let pages = CandidatePages::new(["contact"]).expand("https://example.com/");
    /// assert_eq!(pages[0].url, "https://example.com/");
    /// assert_eq!(pages[1].url, "https://example.com/contact");
    /// ```
    pub fn expand(&self, base_url: &str) -> Vec<CandidatePage> {
        let root = base_url.trim_end_matches('/');

        let mut pages = Vec::with_capacity(self.pages_per_site());
        pages.push(CandidatePage {
            url: base_url.to_string(),
            primary: true,
        });
        pages.extend(self.suffixes.iter().map(|suffix| CandidatePage {
            url: format!("{}/{}", root, suffix),
            primary: false,
        }));
        pages
    }
}

impl Default for CandidatePages {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_PAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expansion_order() {
        let pages = CandidatePages::default().expand("https://example.com");
        let urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://example.com",
                "https://example.com/about",
                "https://example.com/about-us",
                "https://example.com/aboutus",
                "https://example.com/contact",
                "https://example.com/contact-us",
                "https://example.com/contactus",
                "https://example.com/services",
                "https://example.com/our-services",
                "https://example.com/ourservices",
            ]
        );
    }

    #[test]
    fn test_only_base_is_primary() {
        let pages = CandidatePages::default().expand("https://example.com");
        assert!(pages[0].primary);
        assert!(pages[1..].iter().all(|p| !p.primary));
    }

    #[test]
    fn test_trailing_slashes_stripped_before_join() {
        let pages = CandidatePages::new(["contact"]).expand("https://example.com//");

        assert_eq!(pages[0].url, "https://example.com//");
        assert_eq!(pages[1].url, "https://example.com/contact");
    }

    #[test]
    fn test_base_with_path() {
        let pages = CandidatePages::new(["about"]).expand("https://example.com/shop/");
        assert_eq!(pages[1].url, "https://example.com/shop/about");
    }

    #[test]
    fn test_entry_count_matches_catalog() {
        for catalog in [vec![], vec!["a"], vec!["a", "b", "c"]] {
            let expander = CandidatePages::new(catalog.clone());
            let pages = expander.expand("https://example.com");
            assert_eq!(pages.len(), 1 + catalog.len());
            assert_eq!(pages.len(), expander.pages_per_site());
        }
    }

    #[test]
    fn test_custom_catalog_is_cleaned() {
        let expander = CandidatePages::new(["/impressum", "", "  ", "kontakt"]);
        assert_eq!(expander.suffixes(), &["impressum", "kontakt"]);
    }

    #[test]
    fn test_expand_is_restartable() {
        let expander = CandidatePages::default();
        assert_eq!(
            expander.expand("https://example.com"),
            expander.expand("https://example.com")
        );
    }
}
