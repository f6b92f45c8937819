//! Email extraction for a single site

use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::pages::{CandidatePage, CandidatePages};
use crate::extract::find_emails;
use std::collections::BTreeSet;
use thiserror::Error;
use url::Url;

/// Why a site produced no result
#[derive(Debug, Error)]
pub enum SiteExtractionError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("All {pages} pages of {url} failed, last error: {last}")]
    Unreachable {
        url: String,
        pages: usize,
        #[source]
        last: FetchError,
    },
}

/// Visits a site's candidate pages and collects the emails found on them
///
/// Each page goes to the rendered fetcher first when one is available and
/// falls back to plain HTTP when rendering fails.
pub struct SiteExtractor<'a> {
    pages: &'a CandidatePages,
    http: &'a dyn PageFetcher,
    rendered: Option<&'a dyn PageFetcher>,
}

impl<'a> SiteExtractor<'a> {
    pub fn new(
        pages: &'a CandidatePages,
        http: &'a dyn PageFetcher,
        rendered: Option<&'a dyn PageFetcher>,
    ) -> Self {
        Self {
            pages,
            http,
            rendered,
        }
    }

    /// Extracts all emails from `url` and its candidate pages
    ///
    /// # Arguments
    ///
    /// * `url` - Normalized absolute URL of the site
    ///
    /// # Returns
    ///
    /// * `Ok(emails)` - Union of the emails on every page that could be fetched
    /// * `Err(SiteExtractionError)` - The URL is invalid or no page could be fetched
    pub async fn extract(&self, url: &str) -> Result<BTreeSet<String>, SiteExtractionError> {
        Url::parse(url).map_err(|e| SiteExtractionError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let pages = self.pages.expand(url);
        let total = pages.len();
        let mut emails = BTreeSet::new();
        let mut fetched = 0usize;
        let mut last_error = None;

        for page in &pages {
            match self.fetch_page(page).await {
                Ok(content) => {
                    fetched += 1;
                    let found = find_emails(&content);
                    tracing::debug!("{} emails on {}", found.len(), page.url);
                    emails.extend(found);
                }
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", page.url, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) if fetched == 0 => Err(SiteExtractionError::Unreachable {
                url: url.to_string(),
                pages: total,
                last,
            }),
            _ => Ok(emails),
        }
    }

    async fn fetch_page(&self, page: &CandidatePage) -> Result<String, FetchError> {
        if let Some(rendered) = self.rendered {
            match rendered.fetch(page).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    tracing::warn!(
                        "{} fetch failed for {}, falling back to {}: {}",
                        rendered.name(),
                        page.url,
                        self.http.name(),
                        e
                    );
                }
            }
        }

        self.http.fetch(page).await
    }
}
