use serde::Deserialize;
use std::time::Duration;

/// Browser-like User-Agent sent with plain HTTP fetches
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Sub-paths probed on every site after the home page
pub const DEFAULT_CANDIDATE_PAGES: &[&str] = &[
    "about",
    "about-us",
    "aboutus",
    "contact",
    "contact-us",
    "contactus",
    "services",
    "our-services",
    "ourservices",
];

/// Main configuration structure for Contact-Harvest
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub renderer: RendererConfig,
    pub pages: PagesConfig,
    pub batch: BatchConfig,
}

/// Plain HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout for the home page (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Total request timeout for candidate sub-pages (seconds)
    #[serde(rename = "candidate-timeout-secs")]
    pub candidate_timeout_secs: u64,

    /// Skip TLS certificate verification
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_secs(self.candidate_timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
            candidate_timeout_secs: 5,
            accept_invalid_certs: true,
        }
    }
}

/// Headless browser driver configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Whether to try starting the driver at all
    pub enabled: bool,

    /// Path or name of the chromedriver-compatible binary
    #[serde(rename = "driver-path")]
    pub driver_path: String,

    /// Arguments passed to the driver; `{port}` is replaced with `port`
    #[serde(rename = "driver-args")]
    pub driver_args: Vec<String>,

    /// Local port the driver listens on
    pub port: u16,

    /// How long to wait for the driver to answer `/status` (milliseconds)
    #[serde(rename = "startup-timeout-ms")]
    pub startup_timeout_ms: u64,

    /// Pause after navigation so client-side rendering can finish (milliseconds)
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Timeout for a single WebDriver command (seconds)
    #[serde(rename = "command-timeout-secs")]
    pub command_timeout_secs: u64,

    /// Arguments passed to the browser through `goog:chromeOptions`
    #[serde(rename = "browser-args")]
    pub browser_args: Vec<String>,
}

impl RendererConfig {
    /// Driver arguments with the port placeholder filled in
    pub fn resolved_driver_args(&self) -> Vec<String> {
        let port = self.port.to_string();
        self.driver_args
            .iter()
            .map(|arg| arg.replace("{port}", &port))
            .collect()
    }

    /// Base URL of the driver's WebDriver endpoint
    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        let driver_path = if cfg!(windows) {
            "chromedriver.exe"
        } else {
            "chromedriver"
        };

        Self {
            enabled: true,
            driver_path: driver_path.to_string(),
            driver_args: vec!["--port={port}".to_string()],
            port: 9515,
            startup_timeout_ms: 10_000,
            settle_delay_ms: 2_000,
            command_timeout_secs: 60,
            browser_args: [
                "--headless",
                "--disable-gpu",
                "--window-size=1920,1080",
                "--no-sandbox",
                "--disable-dev-shm-usage",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Candidate page catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Path suffixes appended to every site's base URL, in probe order
    pub candidates: Vec<String>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATE_PAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Batch-level settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of sites processed at the same time
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}
