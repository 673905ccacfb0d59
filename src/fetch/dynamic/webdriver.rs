//! WebDriver-backed browser sessions (fantoccini).
//!
//! Network responses are read from Chrome's performance log, which is
//! enabled through the session capabilities and therefore records every
//! response from the first request of a navigation. Bodies are fetched over
//! chromedriver's DevTools passthrough while the tab is still open.

use super::{BrowserDriver, BrowserPage, BrowserSession, NetworkResponse};
use crate::core::config::Config;
use crate::core::error::{AppError, Result};

use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::{TimeoutConfiguration, WebDriverCompatibleCommand, WindowHandle};
use fantoccini::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::map::Map as JsonMap;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use url::Url;

const SCROLL_TO_BOTTOM: &str =
    "window.scrollTo(0, document.body ? document.body.scrollHeight : 0);";

/// Upper bound on response bodies fetched per page.
const MAX_CAPTURED_BODIES: usize = 64;

/// Chrome-specific endpoints that fantoccini has no wrapper for.
#[derive(Debug)]
enum ChromeCommand {
    /// Runs a DevTools command against the current tab.
    Cdp { cmd: &'static str, params: Value },
    /// Drains one of the browser's log buffers.
    Log(&'static str),
}

impl WebDriverCompatibleCommand for ChromeCommand {
    fn endpoint(
        &self,
        base_url: &Url,
        session_id: Option<&str>,
    ) -> std::result::Result<Url, url::ParseError> {
        let session = base_url
            .join("session/")?
            .join(&format!("{}/", session_id.unwrap_or_default()))?;
        match self {
            ChromeCommand::Cdp { .. } => session.join("goog/cdp/execute"),
            ChromeCommand::Log(_) => session.join("se/log"),
        }
    }

    fn method_and_body(&self, _request_url: &Url) -> (http::Method, Option<String>) {
        let body = match self {
            ChromeCommand::Cdp { cmd, params } => serde_json::json!({ "cmd": cmd, "params": params }),
            ChromeCommand::Log(kind) => serde_json::json!({ "type": kind }),
        };
        (http::Method::POST, Some(body.to_string()))
    }
}

#[derive(Deserialize)]
struct LogEntry {
    message: String,
}

#[derive(Deserialize)]
struct PerformanceMessage {
    message: DevToolsEvent,
}

#[derive(Deserialize)]
struct DevToolsEvent {
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseReceived {
    request_id: String,
    response: ResponseMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseMeta {
    #[serde(default)]
    mime_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    #[serde(default)]
    body: String,
    #[serde(default)]
    base64_encoded: bool,
}

/// Picks the `(request id, mime type)` of every scannable response in a
/// performance log drain, in arrival order.
fn scannable_responses(entries: &[LogEntry]) -> Vec<(String, String)> {
    entries
        .iter()
        .filter_map(|entry| serde_json::from_str::<PerformanceMessage>(&entry.message).ok())
        .filter(|m| m.message.method == "Network.responseReceived")
        .filter_map(|m| serde_json::from_value::<ResponseReceived>(m.message.params).ok())
        .map(|r| (r.request_id, r.response.mime_type))
        .filter(|(_, mime)| {
            NetworkResponse {
                content_type: mime.clone(),
                body: String::new(),
            }
            .is_scannable()
        })
        .collect()
}

/// Runs one WebDriver command with an upper bound on how long it may take.
async fn bounded<T, F>(limit: Duration, what: &str, command: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, CmdError>>,
{
    match tokio::time::timeout(limit, command).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::Timeout(format!("{} exceeded {:?}", what, limit))),
    }
}

/// Opens one WebDriver session per `open_session` call.
#[derive(Clone)]
pub struct WebDriverBrowser {
    webdriver_url: String,
    user_agent: String,
    navigation_timeout: Duration,
    command_timeout: Duration,
}

impl WebDriverBrowser {
    pub fn new(config: &Config) -> Option<Self> {
        config.webdriver_url.as_ref().map(|url| Self {
            webdriver_url: url.clone(),
            user_agent: config.user_agent.clone(),
            navigation_timeout: config.navigation_timeout,
            command_timeout: config.browser_command_timeout,
        })
    }

    fn capabilities(&self) -> JsonMap<String, Value> {
        let mut caps = JsonMap::new();
        let mut chrome_opts = JsonMap::new();

        let user_agent = format!("--user-agent={}", self.user_agent);
        let args = vec![
            "--headless=new",
            "--no-sandbox",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--window-size=1280,900",
            "--disable-extensions",
            "--disable-background-networking",
            "--disable-sync",
            "--mute-audio",
            "--ignore-certificate-errors",
            "--log-level=1",
            user_agent.as_str(),
        ];
        chrome_opts.insert("args".to_string(), serde_json::json!(args));

        caps.insert("browserName".to_string(), serde_json::json!("chrome"));
        // Navigation returns at DOMContentLoaded.
        caps.insert("pageLoadStrategy".to_string(), serde_json::json!("eager"));
        caps.insert(
            "goog:loggingPrefs".to_string(),
            serde_json::json!({ "performance": "ALL" }),
        );
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!(chrome_opts),
        );
        caps
    }

    /// Page loads are cut off by the driver itself, so an abandoned
    /// navigation never blocks the commands queued behind it.
    fn timeouts(&self) -> TimeoutConfiguration {
        TimeoutConfiguration::new(
            Some(self.command_timeout),
            Some(self.navigation_timeout),
            None,
        )
    }
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
    async fn open_session(&self) -> Result<Arc<dyn BrowserSession>> {
        tracing::debug!(target: "webdriver", "Connecting to WebDriver at {}...", self.webdriver_url);

        let caps = self.capabilities();
        tracing::trace!(target: "webdriver", "WebDriver capabilities: {:?}", caps);

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);

        let client = match builder.connect(&self.webdriver_url).await {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(target: "webdriver", "Failed to connect to WebDriver at {}: {}", self.webdriver_url, e);
                return Err(e.into());
            }
        };

        if let Err(e) = bounded(
            self.command_timeout,
            "setting session timeouts",
            client.update_timeouts(self.timeouts()),
        )
        .await
        {
            tracing::error!(target: "webdriver", "Could not set WebDriver timeouts: {}", e);
            if let Err(close_err) = client.close().await {
                tracing::debug!(target: "webdriver", "Closing rejected session failed: {}", close_err);
            }
            return Err(e);
        }

        tracing::debug!(target: "webdriver", "WebDriver session opened.");
        Ok(Arc::new(WebDriverSession {
            client: Arc::new(Mutex::new(client)),
            command_timeout: self.command_timeout,
            closed: AtomicBool::new(false),
        }))
    }
}

/// One WebDriver session. Pages are tabs, and an open page holds the
/// session lock until it is closed.
pub struct WebDriverSession {
    client: Arc<Mutex<Client>>,
    command_timeout: Duration,
    closed: AtomicBool,
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AppError::WebDriver("session already closed".to_string()));
        }
        let limit = self.command_timeout;
        let client = self.client.clone().lock_owned().await;
        let original_window = bounded(limit, "reading window handle", client.window()).await?;
        let tab = bounded(limit, "opening tab", client.new_window(true)).await?;
        bounded(limit, "switching to tab", client.switch_to_window(tab.handle)).await?;

        let page = WebDriverPage {
            client,
            original_window,
            command_timeout: limit,
            closed: false,
        };
        // Capture is armed before the first navigation of the tab.
        if let Err(e) = page.chrome(ChromeCommand::Log("performance"), "clearing log").await {
            tracing::debug!(target: "webdriver", "Could not clear performance log: {}", e);
        }
        let enable = ChromeCommand::Cdp {
            cmd: "Network.enable",
            params: serde_json::json!({}),
        };
        if let Err(e) = page.chrome(enable, "enabling network capture").await {
            tracing::debug!(target: "webdriver", "Could not enable network capture: {}", e);
        }
        Ok(Box::new(page))
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let client = self.client.lock().await.clone();
        tracing::debug!(target: "webdriver", "Closing WebDriver session...");
        if let Err(e) = bounded(self.command_timeout, "closing session", client.close()).await {
            tracing::warn!(target: "webdriver", "Failed to close WebDriver session cleanly: {}", e);
        }
    }
}

/// A browser tab inside a [`WebDriverSession`].
pub struct WebDriverPage {
    client: OwnedMutexGuard<Client>,
    original_window: WindowHandle,
    command_timeout: Duration,
    closed: bool,
}

impl WebDriverPage {
    async fn chrome(&self, command: ChromeCommand, what: &str) -> Result<Value> {
        bounded(self.command_timeout, what, self.client.issue_cmd(command)).await
    }

    async fn response_body(&self, request_id: &str) -> Result<Option<String>> {
        let command = ChromeCommand::Cdp {
            cmd: "Network.getResponseBody",
            params: serde_json::json!({ "requestId": request_id }),
        };
        let value = self.chrome(command, "reading response body").await?;
        let body: ResponseBody = serde_json::from_value(value)
            .map_err(|e| AppError::WebDriver(format!("unexpected response body payload: {}", e)))?;
        Ok((!body.base64_encoded).then_some(body.body))
    }
}

#[async_trait]
impl BrowserPage for WebDriverPage {
    async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<()> {
        // The driver enforces `timeout` itself; the local bound only covers
        // a driver that stops answering.
        let limit = timeout + self.command_timeout;
        match tokio::time::timeout(limit, self.client.goto(url.as_str())).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::Timeout(format!(
                "navigation to {} exceeded {:?}",
                url, limit
            ))),
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        bounded(
            self.command_timeout,
            "scrolling",
            self.client.execute(SCROLL_TO_BOTTOM, vec![]),
        )
        .await?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        bounded(self.command_timeout, "reading page source", self.client.source()).await
    }

    async fn network_responses(&mut self) -> Result<Vec<NetworkResponse>> {
        let value = self
            .chrome(ChromeCommand::Log("performance"), "reading performance log")
            .await?;
        let entries: Vec<LogEntry> = serde_json::from_value(value)
            .map_err(|e| AppError::WebDriver(format!("unexpected performance log payload: {}", e)))?;

        let mut responses = Vec::new();
        for (request_id, mime_type) in scannable_responses(&entries)
            .into_iter()
            .take(MAX_CAPTURED_BODIES)
        {
            match self.response_body(&request_id).await {
                Ok(Some(body)) => responses.push(NetworkResponse {
                    content_type: mime_type,
                    body,
                }),
                Ok(None) => {}
                Err(e) => {
                    tracing::trace!(target: "webdriver", "No body for request {}: {}", request_id, e)
                }
            }
        }
        Ok(responses)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let limit = self.command_timeout;
        if let Err(e) = bounded(limit, "closing tab", self.client.close_window()).await {
            tracing::warn!(target: "webdriver", "Failed to close tab: {}", e);
        }
        let original = self.original_window.clone();
        if let Err(e) = bounded(limit, "switching back", self.client.switch_to_window(original)).await {
            tracing::warn!(target: "webdriver", "Failed to switch back to the session window: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser() -> WebDriverBrowser {
        let config = Config {
            webdriver_url: Some("http://localhost:4444".to_string()),
            user_agent: "TestAgent/1.0".to_string(),
            ..Config::default()
        };
        WebDriverBrowser::new(&config).unwrap()
    }

    fn log_entry(method: &str, params: Value) -> LogEntry {
        LogEntry {
            message: serde_json::json!({
                "message": { "method": method, "params": params },
                "webview": "tab-1"
            })
            .to_string(),
        }
    }

    #[test]
    fn browser_requires_webdriver_url() {
        assert!(WebDriverBrowser::new(&Config::default()).is_none());
        let b = browser();
        assert_eq!(b.navigation_timeout, Config::default().navigation_timeout);
        assert_eq!(b.command_timeout, Config::default().browser_command_timeout);
    }

    #[test]
    fn capabilities_request_eager_headless_chrome_with_network_log() {
        let caps = browser().capabilities();

        assert_eq!(caps["browserName"], "chrome");
        assert_eq!(caps["pageLoadStrategy"], "eager");
        assert_eq!(caps["goog:loggingPrefs"]["performance"], "ALL");
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a == "--user-agent=TestAgent/1.0"));
    }

    #[test]
    fn chrome_commands_target_session_endpoints() {
        let base = Url::parse("http://localhost:4444").unwrap();
        let cdp = ChromeCommand::Cdp {
            cmd: "Network.getResponseBody",
            params: serde_json::json!({ "requestId": "42.1" }),
        };

        let url = cdp.endpoint(&base, Some("abc")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4444/session/abc/goog/cdp/execute");
        let (method, body) = cdp.method_and_body(&url);
        assert_eq!(method, http::Method::POST);
        let body: Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(body["cmd"], "Network.getResponseBody");
        assert_eq!(body["params"]["requestId"], "42.1");

        let log = ChromeCommand::Log("performance");
        let url = log.endpoint(&base, Some("abc")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4444/session/abc/se/log");
        let (_, body) = log.method_and_body(&url);
        assert_eq!(body.as_deref(), Some(r#"{"type":"performance"}"#));
    }

    #[test]
    fn performance_log_keeps_textual_responses_in_order() {
        let entries = vec![
            log_entry(
                "Network.responseReceived",
                serde_json::json!({ "requestId": "1", "response": { "mimeType": "text/html" } }),
            ),
            log_entry("Network.requestWillBeSent", serde_json::json!({ "requestId": "2" })),
            log_entry(
                "Network.responseReceived",
                serde_json::json!({ "requestId": "3", "response": { "mimeType": "image/png" } }),
            ),
            LogEntry {
                message: "not json".to_string(),
            },
            log_entry(
                "Network.responseReceived",
                serde_json::json!({ "requestId": "4", "response": { "mimeType": "application/json" } }),
            ),
        ];

        assert_eq!(
            scannable_responses(&entries),
            vec![
                ("1".to_string(), "text/html".to_string()),
                ("4".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn unanswered_command_times_out() {
        let result = bounded(
            Duration::from_millis(20),
            "reading page source",
            std::future::pending::<std::result::Result<String, CmdError>>(),
        )
        .await;

        assert!(matches!(result, Err(AppError::Timeout(msg)) if msg.contains("reading page source")));
    }
}
