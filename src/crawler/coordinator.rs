//! Batch coordinator - main extraction orchestration logic
//!
//! This module contains the batch loop that ties the crawler together:
//! - Accepting and normalizing the URL list
//! - Starting the browser driver once per batch and always releasing it
//! - Running site extractions with per-site failure isolation
//! - Reporting progress after every site

use crate::config::{validate, Config};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::pages::CandidatePages;
use crate::crawler::renderer::{DriverLauncher, RendererHandle, RendererLauncher, RendererState};
use crate::crawler::site::SiteExtractor;
use crate::state::{BatchResult, ProgressSink, SiteResult};
use crate::url::normalize_url;
use crate::HarvestError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Main batch coordinator structure
pub struct Coordinator {
    config: Config,
    pages: CandidatePages,
    http: Arc<dyn PageFetcher>,
    launcher: Option<Arc<dyn RendererLauncher>>,
}

impl Coordinator {
    /// Creates a coordinator with the real HTTP fetcher and browser driver
    ///
    /// # Arguments
    ///
    /// * `config` - Extraction configuration, checked before anything is built
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to process batches
    /// * `Err(HarvestError::Config)` - The configuration is invalid
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        validate(&config)?;

        let http: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);
        let launcher = if config.renderer.enabled {
            Some(Arc::new(DriverLauncher::new(config.renderer.clone())) as Arc<dyn RendererLauncher>)
        } else {
            None
        };

        Self::with_parts(config, http, launcher)
    }

    /// Creates a coordinator from explicit fetch strategies
    ///
    /// Without a launcher every page is fetched over plain HTTP. The
    /// configuration is validated the same way as in [`Coordinator::new`].
    pub fn with_parts(
        config: Config,
        http: Arc<dyn PageFetcher>,
        launcher: Option<Arc<dyn RendererLauncher>>,
    ) -> Result<Self, HarvestError> {
        validate(&config)?;

        let pages = CandidatePages::new(&config.pages.candidates);
        Ok(Self {
            config,
            pages,
            http,
            launcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pages(&self) -> &CandidatePages {
        &self.pages
    }

    /// Normalizes the input list into the URLs a batch will process
    ///
    /// Blank entries are dropped and duplicates keep their first position.
    pub fn accept_urls<S: AsRef<str>>(&self, urls: &[S]) -> Result<Vec<String>, HarvestError> {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();

        for raw in urls {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let url = normalize_url(raw)?;
            if seen.insert(url.clone()) {
                accepted.push(url);
            }
        }

        if accepted.is_empty() {
            return Err(HarvestError::EmptyBatch);
        }

        Ok(accepted)
    }

    /// Runs a complete batch
    ///
    /// Every input URL gets exactly one entry in the result. `progress` hears
    /// the total once up front, then once per URL as soon as its entry is
    /// recorded.
    /// A started browser driver is stopped before this returns, and killed
    /// if the returned future is dropped or a site extraction panics.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchResult)` - One result per distinct input URL, in input order
    /// * `Err(HarvestError::EmptyBatch)` - No usable URL in the input
    pub async fn process<S: AsRef<str>>(
        &self,
        urls: &[S],
        progress: &dyn ProgressSink,
    ) -> Result<BatchResult, HarvestError> {
        let accepted = self.accept_urls(urls)?;
        let total = accepted.len();
        tracing::info!("Starting email extraction for {} URLs", total);
        progress.on_start(total);

        let mut renderer = RendererGuard::new(self.launch_renderer().await);
        let rendered = renderer.fetcher();
        let renderer_down = AtomicBool::new(false);

        let mut slots: Vec<Option<SiteResult>> = (0..total).map(|_| None).collect();
        let mut processed = 0usize;

        {
            let mut sites = stream::iter(accepted.into_iter().enumerate())
                .map(|(index, url)| {
                    let rendered = if renderer_down.load(Ordering::SeqCst) {
                        None
                    } else {
                        rendered.clone()
                    };
                    async move { (index, self.extract_site(&url, rendered).await) }
                })
                .buffer_unordered(self.config.batch.concurrency);

            while let Some((index, result)) = sites.next().await {
                slots[index] = Some(result);
                processed += 1;
                progress.on_progress(processed, total);
                tracing::info!("Progress: {}/{}", processed, total);

                if rendered.is_some()
                    && !renderer_down.load(Ordering::SeqCst)
                    && !renderer.is_running()
                {
                    tracing::warn!("Browser driver is gone, continuing with plain HTTP only");
                    renderer_down.store(true, Ordering::SeqCst);
                }
            }
        }

        renderer.release().await;

        let results: BatchResult = slots.into_iter().flatten().collect();
        tracing::info!(
            "Batch complete: {} sites, {} unique emails",
            results.len(),
            results.unique_emails().len()
        );
        Ok(results)
    }

    async fn launch_renderer(&self) -> Option<Box<dyn RendererHandle>> {
        let launcher = self.launcher.as_ref()?;
        match launcher.launch().await {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("{}; continuing with plain HTTP only", e);
                None
            }
        }
    }

    async fn extract_site(&self, url: &str, rendered: Option<Arc<dyn PageFetcher>>) -> SiteResult {
        tracing::info!("Processing URL: {}", url);
        let extractor = SiteExtractor::new(&self.pages, self.http.as_ref(), rendered.as_deref());

        match extractor.extract(url).await {
            Ok(emails) => {
                tracing::info!("Extracted {} emails from {}", emails.len(), url);
                SiteResult::success(url, emails)
            }
            Err(e) => {
                tracing::error!("Error processing {}: {}", url, e);
                SiteResult::failure(url, e.to_string())
            }
        }
    }
}

/// Owns the batch's renderer and makes sure it ends up stopped
///
/// `release` performs the orderly shutdown. Dropping an unreleased guard,
/// which happens on panic or cancellation, kills the renderer instead.
struct RendererGuard {
    handle: Option<Box<dyn RendererHandle>>,
}

impl RendererGuard {
    fn new(handle: Option<Box<dyn RendererHandle>>) -> Self {
        Self { handle }
    }

    fn fetcher(&self) -> Option<Arc<dyn PageFetcher>> {
        self.handle.as_ref().and_then(|handle| handle.fetcher())
    }

    fn is_running(&mut self) -> bool {
        self.handle
            .as_mut()
            .map(|handle| handle.is_running())
            .unwrap_or(false)
    }

    async fn release(mut self) {
        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.stop().await {
                tracing::warn!("{}", e);
            }
            if handle.state() != RendererState::Stopped {
                handle.abort();
            }
        }
        // Cleared only after stop so a cancelled shutdown still aborts in Drop
        self.handle = None;
    }
}

impl Drop for RendererGuard {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            tracing::warn!("Batch ended before the browser driver was released, killing it");
            // Session cleanup needs a runtime; without one the driver is only killed
            handle.abort();
        }
    }
}
