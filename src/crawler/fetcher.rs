//! Page fetching
//!
//! This module defines the [`PageFetcher`] capability shared by both fetch
//! strategies, and the plain HTTP implementation:
//! - Building the HTTP client with browser-like headers and timeouts
//! - Shorter timeouts for candidate sub-pages
//! - Treating HTTP error statuses as empty pages
//! - Error classification for connection-level failures

use crate::config::FetchConfig;
use crate::crawler::pages::CandidatePage;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Failure to fetch a single page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Browser driver error for {url}: {message}")]
    Driver { url: String, message: String },

    #[error("Browser driver is no longer reachable")]
    RendererLost,
}

impl FetchError {
    /// Classifies a reqwest error raised while fetching `url`
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if err.is_connect() {
            FetchError::Connect {
                url,
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            FetchError::Body {
                url,
                message: err.to_string(),
            }
        } else {
            FetchError::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// A strategy for retrieving the content of one page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page's HTML or text content
    async fn fetch(&self, page: &CandidatePage) -> Result<String, FetchError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Builds an HTTP client with the configured headers and timeouts
///
/// # Example
///
/// ```no_run
/// use contact_harvest::config::FetchConfig;
/// use contact_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages directly over HTTP(S) without rendering
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    candidate_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            candidate_timeout: config.candidate_timeout(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a page, returning an empty string for non-2xx responses
    ///
    /// Only failures below HTTP (DNS, connect, TLS, timeout, broken body) are
    /// errors; a 404 or 500 means the site answered and simply has no content
    /// for us.
    async fn fetch(&self, page: &CandidatePage) -> Result<String, FetchError> {
        let mut request = self.client.get(&page.url);
        if !page.primary {
            request = request.timeout(self.candidate_timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&page.url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered HTTP {}, treating as empty", page.url, status);
            return Ok(String::new());
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&page.url, e))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
