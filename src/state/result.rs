//! Per-site and per-batch extraction results

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeSet, HashMap};

/// Outcome of extracting one site
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SiteResult {
    /// Normalized site address
    pub url: String,

    /// Deduplicated addresses found across all probed pages
    pub emails: BTreeSet<String>,

    /// Why the site could not be processed, if it could not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SiteResult {
    pub fn success(url: impl Into<String>, emails: BTreeSet<String>) -> Self {
        Self {
            url: url.into(),
            emails,
            error: None,
        }
    }

    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            emails: BTreeSet::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Results for a whole batch, one entry per accepted site
///
/// Iterates in input order and supports lookup by normalized URL. Serializes
/// as a JSON object keyed by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    sites: Vec<SiteResult>,
    index: HashMap<String, usize>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a site's result, replacing any earlier entry for the same URL
    pub fn insert(&mut self, result: SiteResult) {
        match self.index.get(&result.url) {
            Some(&pos) => self.sites[pos] = result,
            None => {
                self.index.insert(result.url.clone(), self.sites.len());
                self.sites.push(result);
            }
        }
    }

    pub fn get(&self, url: &str) -> Option<&SiteResult> {
        self.index.get(url).map(|&pos| &self.sites[pos])
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteResult> {
        self.sites.iter()
    }

    /// Total number of distinct addresses across all sites
    pub fn unique_emails(&self) -> BTreeSet<&str> {
        self.sites
            .iter()
            .flat_map(|site| site.emails.iter().map(String::as_str))
            .collect()
    }
}

impl FromIterator<SiteResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = SiteResult>>(iter: I) -> Self {
        let mut batch = BatchResult::new();
        for result in iter {
            batch.insert(result);
        }
        batch
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a SiteResult;
    type IntoIter = std::slice::Iter<'a, SiteResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.sites.iter()
    }
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sites.len()))?;
        for site in &self.sites {
            map.serialize_entry(&site.url, site)?;
        }
        map.end()
    }
}
