//! Mock collaborators for unit tests. Each one records how it was called.

use crate::core::error::{AppError, Result};
use crate::core::models::{BusinessDescriptor, DiscoveryPage, PageFetch};
use crate::fetch::{BrowserDriver, BrowserPage, BrowserSession, NetworkResponse, PageSource};
use crate::providers::{DiscoveryFeed, WebSearch};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// A discovery page whose businesses get a `<name>.qa` website.
pub fn page_of(names: &[&str], next_page_token: Option<&str>) -> DiscoveryPage {
    DiscoveryPage {
        businesses: names
            .iter()
            .map(|name| {
                let website = format!("{}.qa", name.to_lowercase().replace(' ', "-"));
                BusinessDescriptor::new(*name, (!name.is_empty()).then_some(website.as_str()))
            })
            .collect(),
        next_page_token: next_page_token.map(str::to_string),
    }
}

// =============================================================================
// Plain HTTP
// =============================================================================

/// Unregistered URLs answer 404.
pub struct MockPageSource {
    pages: HashMap<String, PageFetch>,
    panics: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MockPageSource {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            panics: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages
            .insert(url.to_string(), PageFetch::Body(body.to_string()));
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            PageFetch::Failed("connection refused".to_string()),
        );
        self
    }

    /// Requests for `url` panic, as a crashing resolution would.
    pub fn panicking(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn get(&self, url: &Url) -> PageFetch {
        self.requests.lock().unwrap().push(url.to_string());
        if self.panics.contains(url.as_str()) {
            panic!("simulated crash while fetching {}", url);
        }
        self.pages
            .get(url.as_str())
            .cloned()
            .unwrap_or(PageFetch::Status(404))
    }
}

// =============================================================================
// Search providers
// =============================================================================

pub struct MockSearch {
    response: std::result::Result<Vec<String>, String>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockSearch {
    pub fn returning(snippets: Vec<String>) -> Self {
        Self {
            response: Ok(snippets),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err("quota exhausted".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    async fn snippets(&self, query: &str, count: usize) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push((query.to_string(), count));
        self.response.clone().map_err(AppError::Search)
    }
}

/// Scripted pages keyed by `(query, token)`. Unscripted requests get an
/// empty page.
pub struct MockDiscoveryFeed {
    pages: HashMap<(String, Option<String>), DiscoveryPage>,
    failing: HashSet<String>,
    unlimited_page_size: Option<usize>,
    generated: AtomicUsize,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockDiscoveryFeed {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failing: HashSet::new(),
            unlimited_page_size: None,
            generated: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every request returns `page_size` never-seen businesses and a token.
    pub fn unlimited(page_size: usize) -> Self {
        Self {
            unlimited_page_size: Some(page_size),
            ..Self::new()
        }
    }

    pub fn with_page(mut self, query: &str, token: Option<&str>, page: DiscoveryPage) -> Self {
        self.pages
            .insert((query.to_string(), token.map(str::to_string)), page);
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiscoveryFeed for MockDiscoveryFeed {
    async fn fetch_page(&self, query: &str, page_token: Option<&str>) -> Result<DiscoveryPage> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), page_token.map(str::to_string)));

        if self.failing.contains(query) {
            return Err(AppError::Discovery("simulated outage".to_string()));
        }

        if let Some(size) = self.unlimited_page_size {
            let start = self.generated.fetch_add(size, Ordering::SeqCst);
            return Ok(DiscoveryPage {
                businesses: (start..start + size)
                    .map(|i| BusinessDescriptor::new(format!("Business {}", i), None))
                    .collect(),
                next_page_token: Some(format!("page-{}", start + size)),
            });
        }

        Ok(self
            .pages
            .get(&(query.to_string(), page_token.map(str::to_string)))
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Browser
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MockPage {
    html: String,
    responses: Vec<NetworkResponse>,
    fail_navigation: bool,
}

impl MockPage {
    pub fn rendering(html: &str) -> Self {
        Self {
            html: html.to_string(),
            ..Self::default()
        }
    }

    pub fn responding(mut self, content_type: &str, body: &str) -> Self {
        self.responses.push(NetworkResponse {
            content_type: content_type.to_string(),
            body: body.to_string(),
        });
        self
    }

    pub fn failing_navigation() -> Self {
        Self {
            fail_navigation: true,
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct SessionLog {
    visited: Vec<String>,
    opened: usize,
    closed: usize,
}

/// Unscripted URLs render an empty document.
#[derive(Clone, Default)]
pub struct MockBrowserSession {
    pages: Arc<HashMap<String, MockPage>>,
    log: Arc<Mutex<SessionLog>>,
    close_counter: Option<Arc<AtomicUsize>>,
}

impl MockBrowserSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: MockPage) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), page);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.log.lock().unwrap().visited.clone()
    }

    pub fn pages_opened(&self) -> usize {
        self.log.lock().unwrap().opened
    }

    pub fn pages_closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }
}

#[async_trait]
impl BrowserSession for MockBrowserSession {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>> {
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(MockPageHandle {
            pages: Arc::clone(&self.pages),
            log: Arc::clone(&self.log),
            current: None,
            closed: false,
        }))
    }

    async fn close(&self) {
        if let Some(counter) = &self.close_counter {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct MockPageHandle {
    pages: Arc<HashMap<String, MockPage>>,
    log: Arc<Mutex<SessionLog>>,
    current: Option<MockPage>,
    closed: bool,
}

#[async_trait]
impl BrowserPage for MockPageHandle {
    async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<()> {
        self.log.lock().unwrap().visited.push(url.to_string());
        let page = self.pages.get(url.as_str()).cloned().unwrap_or_default();
        let failed = page.fail_navigation;
        // Responses captured before a failed navigation stay readable.
        self.current = Some(page);
        if failed {
            return Err(AppError::Timeout(format!(
                "navigation to {} exceeded {:?}",
                url, timeout
            )));
        }
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self
            .current
            .as_ref()
            .map(|p| p.html.clone())
            .unwrap_or_default())
    }

    async fn network_responses(&mut self) -> Result<Vec<NetworkResponse>> {
        Ok(self
            .current
            .as_ref()
            .map(|p| p.responses.clone())
            .unwrap_or_default())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.lock().unwrap().closed += 1;
        }
    }
}

/// Hands out sessions cloned from one scripted template.
pub struct MockBrowserDriver {
    template: MockBrowserSession,
    fail: bool,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl MockBrowserDriver {
    pub fn new() -> Self {
        Self::with_session(MockBrowserSession::new())
    }

    pub fn with_session(template: MockBrowserSession) -> Self {
        Self {
            template,
            fail: false,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for MockBrowserDriver {
    async fn open_session(&self) -> Result<Arc<dyn BrowserSession>> {
        if self.fail {
            return Err(AppError::WebDriver("connection refused".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockBrowserSession {
            close_counter: Some(Arc::clone(&self.closed)),
            ..self.template.clone()
        }))
    }
}
