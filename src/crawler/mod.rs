//! Crawler module for page fetching and email extraction
//!
//! This module contains the core extraction logic, including:
//! - Plain HTTP and browser-rendered page fetching
//! - Candidate page expansion per site
//! - Browser driver lifecycle management
//! - Overall batch coordination

mod coordinator;
mod fetcher;
mod pages;
mod renderer;
mod site;
mod webdriver;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use pages::{CandidatePage, CandidatePages};
pub use renderer::{
    DriverHandle, DriverLauncher, RendererError, RendererHandle, RendererLauncher, RendererState,
};
pub use site::{SiteExtractionError, SiteExtractor};
pub use webdriver::WebDriverSession;

use crate::config::Config;
use crate::state::{BatchResult, NoProgress, ProgressSink};
use crate::HarvestError;

/// Extracts emails from a batch of URLs
///
/// This is the main entry point for callers that do not need to inject
/// their own fetchers. It will:
/// 1. Build the HTTP fetcher and, if enabled, the browser driver launcher
/// 2. Normalize and de-duplicate the URL list
/// 3. Visit every site and its candidate pages
/// 4. Report progress after each site
///
/// # Arguments
///
/// * `config` - The extraction configuration
/// * `urls` - Site addresses, with or without a scheme
/// * `progress` - Optional sink receiving `(processed, total)` updates
///
/// # Returns
///
/// * `Ok(BatchResult)` - One entry per distinct input URL
/// * `Err(HarvestError)` - The configuration is invalid or the batch could
///   not be started
pub async fn extract_emails<S: AsRef<str>>(
    config: Config,
    urls: &[S],
    progress: Option<&dyn ProgressSink>,
) -> Result<BatchResult, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    coordinator
        .process(urls, progress.unwrap_or(&NoProgress))
        .await
}
