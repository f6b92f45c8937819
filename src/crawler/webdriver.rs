//! Minimal W3C WebDriver client for rendered page fetches
//!
//! Speaks just enough of the protocol to create a browser session, navigate
//! it, read back the rendered page source, and close it again.

use crate::config::RendererConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::pages::CandidatePage;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Longest slice of a driver response body quoted in errors
const MAX_ERROR_BODY: usize = 240;

/// A browser session on a running WebDriver endpoint
///
/// Navigation is serialized: a browser session can only show one page at a
/// time, so concurrent fetches queue behind `nav_lock`.
#[derive(Debug)]
pub struct WebDriverSession {
    client: Client,
    endpoint: String,
    session_id: String,
    settle_delay: Duration,
    nav_lock: Mutex<()>,
    lost: AtomicBool,
}

impl WebDriverSession {
    /// Creates a new browser session on `endpoint`
    ///
    /// Returns a plain error message; the launcher wraps it into a startup
    /// failure.
    pub async fn create(endpoint: &str, config: &RendererConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(config.command_timeout())
            .build()
            .map_err(|e| format!("failed to build driver client: {}", e))?;
        let endpoint = endpoint.trim_end_matches('/').to_string();

        let res = client
            .post(format!("{}/session", endpoint))
            .json(&capabilities(&config.browser_args))
            .send()
            .await
            .map_err(|e| format!("session create request failed: {}", e))?;
        let value = read_value(res)
            .await
            .map_err(|e| format!("session create failed: {}", e))?;

        let session_id = value
            .pointer("/value/sessionId")
            .or_else(|| value.pointer("/sessionId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "session id missing in driver response".to_string())?;

        tracing::debug!("Created WebDriver session {}", session_id);

        Ok(Self {
            client,
            endpoint,
            session_id,
            settle_delay: config.settle_delay(),
            nav_lock: Mutex::new(()),
            lost: AtomicBool::new(false),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns true once the driver stopped answering
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Closes the browser session
    pub async fn delete(&self) -> Result<(), String> {
        let res = self
            .client
            .delete(self.session_url(""))
            .send()
            .await
            .map_err(|e| format!("delete session request failed: {}", e))?;
        read_value(res)
            .await
            .map(|_| ())
            .map_err(|e| format!("delete session failed: {}", e))
    }

    fn session_url(&self, suffix: &str) -> String {
        format!("{}/session/{}{}", self.endpoint, self.session_id, suffix)
    }

    async fn navigate(&self, url: &str) -> Result<(), FetchError> {
        let res = self
            .client
            .post(self.session_url("/url"))
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        read_value(res)
            .await
            .map(|_| ())
            .map_err(|message| FetchError::Driver {
                url: url.to_string(),
                message: format!("navigate: {}", message),
            })
    }

    async fn page_source(&self, url: &str) -> Result<String, FetchError> {
        let res = self
            .client
            .get(self.session_url("/source"))
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        let value = read_value(res).await.map_err(|message| FetchError::Driver {
            url: url.to_string(),
            message: format!("page source: {}", message),
        })?;

        Ok(value
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Maps a failed request to the driver, flagging the session when the
    /// driver itself is gone
    fn transport_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_connect() {
            tracing::warn!("Browser driver at {} stopped answering", self.endpoint);
            self.lost.store(true, Ordering::SeqCst);
            return FetchError::RendererLost;
        }
        FetchError::from_reqwest(url, err)
    }
}

#[async_trait]
impl PageFetcher for WebDriverSession {
    async fn fetch(&self, page: &CandidatePage) -> Result<String, FetchError> {
        if self.is_lost() {
            return Err(FetchError::RendererLost);
        }

        let _nav = self.nav_lock.lock().await;

        tracing::debug!("Browsing to {}", page.url);
        self.navigate(&page.url).await?;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        self.page_source(&page.url).await
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

/// Session capabilities for a headless Chrome with the configured arguments
fn capabilities(browser_args: &[String]) -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "acceptInsecureCerts": true,
                "goog:chromeOptions": { "args": browser_args }
            }
        }
    })
}

/// Reads a driver response, surfacing HTTP and protocol-level errors
async fn read_value(res: Response) -> Result<Value, String> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| format!("response read failed: {}", e))?;

    let value: Value = serde_json::from_str(&body).unwrap_or_default();
    if let Some(err) = value.pointer("/value/error").and_then(Value::as_str) {
        let message = value
            .pointer("/value/message")
            .and_then(Value::as_str)
            .unwrap_or("unknown webdriver error");
        return Err(format!("{}: {}", err, message));
    }

    if !status.is_success() {
        return Err(format!(
            "HTTP {}: {}",
            status.as_u16(),
            truncate(&body, MAX_ERROR_BODY)
        ));
    }

    Ok(value)
}

fn truncate(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}
