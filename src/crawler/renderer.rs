//! Browser driver lifecycle
//!
//! The rendered fetch strategy needs a chromedriver-compatible process and a
//! browser session on it. [`RendererLauncher`] starts both and hands back a
//! [`RendererHandle`]; the coordinator owns that handle for one batch and
//! must bring it to [`RendererState::Stopped`] before returning.

use crate::config::RendererConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::webdriver::WebDriverSession;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::time::Instant;

/// Delay between two readiness probes of a starting driver
const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Timeout of a single readiness probe
const READY_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long an aborted driver gets to close its browser session
const ABORT_SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Renderer lifecycle failures
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Failed to start browser driver: {0}")]
    Startup(String),

    #[error("Failed to stop browser driver: {0}")]
    Shutdown(String),
}

/// Lifecycle state of a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    NotStarted,
    Running,
    Stopped,
}

/// Starts a renderer for one batch
#[async_trait]
pub trait RendererLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn RendererHandle>, RendererError>;
}

/// A started renderer
///
/// `stop` is the orderly shutdown. `abort` is synchronous so it can run from
/// `Drop` when a batch unwinds or is cancelled.
#[async_trait]
pub trait RendererHandle: Send {
    /// Fetcher backed by this renderer, `None` unless running
    fn fetcher(&self) -> Option<Arc<dyn PageFetcher>>;

    fn state(&self) -> RendererState;

    /// Checks whether the renderer is still alive, recording a crash as stopped
    fn is_running(&mut self) -> bool;

    async fn stop(&mut self) -> Result<(), RendererError>;

    /// Kills the renderer without waiting for it
    fn abort(&mut self);
}

/// Launches a chromedriver-compatible binary per batch
#[derive(Debug, Clone)]
pub struct DriverLauncher {
    config: RendererConfig,
}

impl DriverLauncher {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RendererLauncher for DriverLauncher {
    async fn launch(&self) -> Result<Box<dyn RendererHandle>, RendererError> {
        let mut handle = DriverHandle::new(self.config.clone());
        handle.start().await?;
        Ok(Box::new(handle))
    }
}

/// A driver process plus the browser session opened on it
#[derive(Debug)]
pub struct DriverHandle {
    config: RendererConfig,
    child: Option<Child>,
    session: Option<Arc<WebDriverSession>>,
    state: RendererState,
}

impl DriverHandle {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            child: None,
            session: None,
            state: RendererState::NotStarted,
        }
    }

    /// Spawns the driver, waits until it answers and opens a session
    ///
    /// On failure the spawned process is killed again and the handle stays
    /// in `NotStarted`.
    pub async fn start(&mut self) -> Result<(), RendererError> {
        if self.state == RendererState::Running {
            return Ok(());
        }

        let args = self.config.resolved_driver_args();
        tracing::info!(
            "Starting browser driver {} {}",
            self.config.driver_path,
            args.join(" ")
        );

        let child = Command::new(&self.config.driver_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RendererError::Startup(format!(
                    "failed to spawn {}: {}",
                    self.config.driver_path, e
                ))
            })?;
        self.child = Some(child);

        if let Err(e) = self.wait_ready().await {
            self.kill_child().await;
            return Err(e);
        }

        let endpoint = self.config.endpoint();
        match WebDriverSession::create(&endpoint, &self.config).await {
            Ok(session) => {
                self.session = Some(Arc::new(session));
                self.state = RendererState::Running;
                tracing::info!("Browser driver ready at {}", endpoint);
                Ok(())
            }
            Err(message) => {
                self.kill_child().await;
                Err(RendererError::Startup(message))
            }
        }
    }

    /// Polls the driver's status endpoint until it is ready, exits or the
    /// startup timeout passes
    async fn wait_ready(&mut self) -> Result<(), RendererError> {
        let client = Client::builder()
            .timeout(READY_PROBE_TIMEOUT)
            .build()
            .map_err(|e| RendererError::Startup(format!("failed to build probe client: {}", e)))?;
        let status_url = format!("{}/status", self.config.endpoint());
        let deadline = Instant::now() + self.config.startup_timeout();

        loop {
            if let Some(child) = self.child.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    return Err(RendererError::Startup(format!(
                        "{} exited early with {}",
                        self.config.driver_path, status
                    )));
                }
            }

            if driver_ready(&client, &status_url).await {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(RendererError::Startup(format!(
                    "{} did not become ready within {:?}",
                    self.config.driver_path,
                    self.config.startup_timeout()
                )));
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!("Killing driver process failed: {}", e);
            }
        }
    }
}

#[async_trait]
impl RendererHandle for DriverHandle {
    fn fetcher(&self) -> Option<Arc<dyn PageFetcher>> {
        if self.state != RendererState::Running {
            return None;
        }
        self.session
            .as_ref()
            .map(|session| Arc::clone(session) as Arc<dyn PageFetcher>)
    }

    fn state(&self) -> RendererState {
        self.state
    }

    fn is_running(&mut self) -> bool {
        if self.state != RendererState::Running {
            return false;
        }

        let exited = match self.child.as_mut() {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => true,
        };
        if exited {
            tracing::warn!("Browser driver process exited unexpectedly");
            self.child = None;
            self.session = None;
            self.state = RendererState::Stopped;
            return false;
        }
        true
    }

    async fn stop(&mut self) -> Result<(), RendererError> {
        if self.state != RendererState::Running {
            self.state = RendererState::Stopped;
            return Ok(());
        }

        let mut problems = Vec::new();

        if let Some(session) = self.session.take() {
            if !session.is_lost() {
                if let Err(e) = session.delete().await {
                    problems.push(e);
                }
            }
        }

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                problems.push(format!("failed to kill driver process: {}", e));
            }
        }

        self.state = RendererState::Stopped;
        tracing::info!("Browser driver stopped");

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RendererError::Shutdown(problems.join("; ")))
        }
    }

    /// Kills the driver without waiting
    ///
    /// Inside a tokio runtime the session is deleted first on a background
    /// task, so the browser it owns is closed before the driver dies. If the
    /// runtime shuts down before that task finishes, `kill_on_drop` still
    /// kills the driver, but the browser may outlive it.
    fn abort(&mut self) {
        let session = self.session.take().filter(|session| !session.is_lost());
        self.state = RendererState::Stopped;

        let Some(mut child) = self.child.take() else {
            return;
        };

        match (session, tokio::runtime::Handle::try_current()) {
            (Some(session), Ok(runtime)) => {
                runtime.spawn(async move {
                    match tokio::time::timeout(ABORT_SESSION_TIMEOUT, session.delete()).await {
                        Ok(Err(e)) => tracing::debug!("Aborted driver kept its session: {}", e),
                        Err(_) => tracing::debug!("Timed out deleting session of aborted driver"),
                        Ok(Ok(())) => {}
                    }
                    if let Err(e) = child.kill().await {
                        tracing::debug!("Killing driver process failed: {}", e);
                    }
                });
            }
            _ => {
                if let Err(e) = child.start_kill() {
                    tracing::debug!("Killing driver process failed: {}", e);
                }
            }
        }
    }
}

/// Returns true when `/status` answers and does not report `ready: false`
async fn driver_ready(client: &Client, status_url: &str) -> bool {
    let res = match client.get(status_url).send().await {
        Ok(res) if res.status().is_success() => res,
        _ => return false,
    };

    match res.json::<Value>().await {
        Ok(value) => value
            .pointer("/value/ready")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn config(driver_path: &str, driver_args: &[&str], port: u16) -> RendererConfig {
        RendererConfig {
            driver_path: driver_path.to_string(),
            driver_args: driver_args.iter().map(|s| s.to_string()).collect(),
            port,
            startup_timeout_ms: 3_000,
            settle_delay_ms: 0,
            command_timeout_secs: 5,
            ..RendererConfig::default()
        }
    }

    /// Serves the driver endpoints a session needs
    async fn fake_driver() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {"ready": true, "message": "ready"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {"sessionId": "s1", "capabilities": {}}
            })))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_resolved_driver_args() {
        let config = config("chromedriver", &["--port={port}", "--silent"], 4444);
        assert_eq!(
            config.resolved_driver_args(),
            vec!["--port=4444".to_string(), "--silent".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_startup_error() {
        let launcher = DriverLauncher::new(config(
            "/nonexistent/contact-harvest-driver",
            &["--port={port}"],
            free_port(),
        ));

        match launcher.launch().await {
            Err(RendererError::Startup(message)) => assert!(message.contains("failed to spawn")),
            Err(other) => panic!("expected startup error, got {:?}", other),
            Ok(_) => panic!("launch should fail"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_early_exit_is_startup_error() {
        let mut handle = DriverHandle::new(config("false", &[], free_port()));

        match handle.start().await {
            Err(RendererError::Startup(message)) => assert!(message.contains("exited early")),
            other => panic!("expected startup error, got {:?}", other),
        }
        assert_eq!(handle.state(), RendererState::NotStarted);
        assert!(handle.fetcher().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_and_stop_lifecycle() {
        let server = fake_driver().await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .expect(1)
            .mount(&server)
            .await;

        let port = server.address().port();
        let mut handle = DriverHandle::new(config("sleep", &["30"], port));
        assert_eq!(handle.state(), RendererState::NotStarted);

        handle.start().await.unwrap();
        assert_eq!(handle.state(), RendererState::Running);
        assert!(handle.is_running());
        assert_eq!(handle.fetcher().map(|f| f.name()), Some("browser"));

        handle.stop().await.unwrap();
        assert_eq!(handle.state(), RendererState::Stopped);
        assert!(!handle.is_running());
        assert!(handle.fetcher().is_none());

        // Stopping twice is harmless
        handle.stop().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_crash_is_detected() {
        let server = fake_driver().await;
        let port = server.address().port();
        let mut handle = DriverHandle::new(config("sleep", &["1"], port));

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_000)).await;

        assert!(!handle.is_running());
        assert_eq!(handle.state(), RendererState::Stopped);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abort_kills_process() {
        let server = fake_driver().await;
        let port = server.address().port();
        let mut handle = DriverHandle::new(config("sleep", &["30"], port));

        handle.start().await.unwrap();
        handle.abort();

        assert_eq!(handle.state(), RendererState::Stopped);
        assert!(!handle.is_running());
        assert!(handle.fetcher().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abort_deletes_session_before_kill() {
        let server = fake_driver().await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .expect(1)
            .mount(&server)
            .await;
        let port = server.address().port();
        let mut handle = DriverHandle::new(config("sleep", &["30"], port));

        handle.start().await.unwrap();
        handle.abort();
        assert_eq!(handle.state(), RendererState::Stopped);

        let deadline = Instant::now() + Duration::from_secs(3);
        loop {
            let requests = server.received_requests().await.unwrap_or_default();
            if requests.iter().any(|r| r.method.to_string() == "DELETE") {
                break;
            }
            assert!(Instant::now() < deadline, "session was never deleted");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_abort_outside_runtime_only_kills() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (server, mut handle) = runtime.block_on(async {
            let server = fake_driver().await;
            let mut handle = DriverHandle::new(config("sleep", &["30"], server.address().port()));
            handle.start().await.unwrap();
            (server, handle)
        });

        handle.abort();
        assert_eq!(handle.state(), RendererState::Stopped);

        let requests = runtime.block_on(async move { server.received_requests().await });
        assert!(requests
            .unwrap_or_default()
            .iter()
            .all(|r| r.method.to_string() != "DELETE"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_readiness_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {"ready": false}
            })))
            .mount(&server)
            .await;

        let mut cfg = config("sleep", &["30"], server.address().port());
        cfg.startup_timeout_ms = 500;
        let mut handle = DriverHandle::new(cfg);

        match handle.start().await {
            Err(RendererError::Startup(message)) => assert!(message.contains("did not become ready")),
            other => panic!("expected startup error, got {:?}", other),
        }
    }
}
