//! Stub fetchers and renderers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use contact_harvest::crawler::{
    CandidatePage, FetchError, PageFetcher, RendererError, RendererHandle, RendererLauncher,
    RendererState,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Serves canned page content keyed by URL
///
/// URLs without an entry get `fallback` if set, otherwise a connection error.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    fallback: Option<String>,
    hang_on: Option<String>,
    panic_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(url.to_string(), content.to_string());
        self
    }

    pub fn fallback(mut self, content: &str) -> Self {
        self.fallback = Some(content.to_string());
        self
    }

    /// Never completes a fetch of `url`
    pub fn hang_on(mut self, url: &str) -> Self {
        self.hang_on = Some(url.to_string());
        self
    }

    /// Panics when asked for `url`
    pub fn panic_on(mut self, url: &str) -> Self {
        self.panic_on = Some(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, page: &CandidatePage) -> Result<String, FetchError> {
        if self.panic_on.as_deref() == Some(page.url.as_str()) {
            panic!("stub fetcher asked to panic on {}", page.url);
        }
        if self.hang_on.as_deref() == Some(page.url.as_str()) {
            std::future::pending::<()>().await;
        }

        self.calls.lock().unwrap().push(page.url.clone());

        if let Some(content) = self.pages.get(&page.url) {
            return Ok(content.clone());
        }
        self.fallback.clone().ok_or_else(|| FetchError::Connect {
            url: page.url.clone(),
            message: "connection refused".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// What happened to the renderers a [`StubLauncher`] handed out
#[derive(Default)]
pub struct RendererLog {
    pub launched: AtomicUsize,
    pub stopped: AtomicUsize,
    pub aborted: AtomicUsize,
}

impl RendererLog {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }

    /// True when every launched renderer was brought down exactly once
    pub fn all_released(&self) -> bool {
        self.launched() == self.stopped() + self.aborted()
    }
}

/// Launcher handing out in-process renderers backed by a stub fetcher
pub struct StubLauncher {
    fetcher: Arc<dyn PageFetcher>,
    pub log: Arc<RendererLog>,
    /// Shared liveness flag; clearing it simulates a driver crash
    pub alive: Arc<AtomicBool>,
    fail_startup: bool,
    fail_shutdown: bool,
}

impl StubLauncher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            log: Arc::new(RendererLog::default()),
            alive: Arc::new(AtomicBool::new(true)),
            fail_startup: false,
            fail_shutdown: false,
        }
    }

    pub fn failing_startup(mut self) -> Self {
        self.fail_startup = true;
        self
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }
}

#[async_trait]
impl RendererLauncher for StubLauncher {
    async fn launch(&self) -> Result<Box<dyn RendererHandle>, RendererError> {
        if self.fail_startup {
            return Err(RendererError::Startup("stub driver missing".to_string()));
        }
        self.log.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubHandle {
            fetcher: Arc::clone(&self.fetcher),
            log: Arc::clone(&self.log),
            alive: Arc::clone(&self.alive),
            state: RendererState::Running,
            fail_shutdown: self.fail_shutdown,
        }))
    }
}

pub struct StubHandle {
    fetcher: Arc<dyn PageFetcher>,
    log: Arc<RendererLog>,
    alive: Arc<AtomicBool>,
    state: RendererState,
    fail_shutdown: bool,
}

#[async_trait]
impl RendererHandle for StubHandle {
    fn fetcher(&self) -> Option<Arc<dyn PageFetcher>> {
        (self.state == RendererState::Running).then(|| Arc::clone(&self.fetcher))
    }

    fn state(&self) -> RendererState {
        self.state
    }

    fn is_running(&mut self) -> bool {
        if self.state == RendererState::Running && !self.alive.load(Ordering::SeqCst) {
            self.state = RendererState::Stopped;
        }
        self.state == RendererState::Running
    }

    async fn stop(&mut self) -> Result<(), RendererError> {
        self.state = RendererState::Stopped;
        self.log.stopped.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdown {
            return Err(RendererError::Shutdown("stub session refused to close".to_string()));
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.state = RendererState::Stopped;
        self.log.aborted.fetch_add(1, Ordering::SeqCst);
    }
}
