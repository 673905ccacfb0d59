//! Browser-rendered probing for sites that only reveal contacts after
//! JavaScript runs.

mod webdriver;

pub use webdriver::{WebDriverBrowser, WebDriverPage, WebDriverSession};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::models::{Candidate, StrategyTag};
use crate::extraction::CandidateExtractor;
use crate::scoring::is_selectable;
use crate::utils::domain::{is_missing_website, normalize_website};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A network response observed while a page was loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResponse {
    pub content_type: String,
    pub body: String,
}

impl NetworkResponse {
    /// Only textual and JSON bodies are worth scanning.
    pub fn is_scannable(&self) -> bool {
        let content_type = self.content_type.to_lowercase();
        content_type.contains("json") || content_type.contains("text")
    }
}

/// Opens browser sessions. One session is shared by several concurrent tasks.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn open_session(&self) -> Result<Arc<dyn BrowserSession>>;
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Opens a fresh, isolated page.
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>>;

    async fn close(&self);
}

/// A single page. `close` must be safe to call more than once.
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigates and returns once the DOM is ready.
    async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<()>;

    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// The fully rendered document.
    async fn content(&mut self) -> Result<String>;

    /// Responses captured since the page was opened, in arrival order.
    /// Must stay readable after a failed `goto`.
    async fn network_responses(&mut self) -> Result<Vec<NetworkResponse>>;

    async fn close(&mut self);
}

/// Visits the website and its configured contact paths in a real browser.
///
/// Returns the page-content hits followed by the hits from intercepted
/// network bodies. Stops visiting once the page-content hits are selectable.
pub async fn fetch_dynamic(
    session: &dyn BrowserSession,
    extractor: &CandidateExtractor,
    config: &Config,
    website: Option<&str>,
) -> Vec<Candidate> {
    let website = match website {
        Some(w) if !is_missing_website(w) => w,
        _ => return Vec::new(),
    };

    let base = match normalize_website(website) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(target: "dynamic_fetch", "[{}] Unusable website: {}", website, e);
            return Vec::new();
        }
    };

    let mut targets = vec![base.clone()];
    for path in &config.dynamic_paths {
        match base.join(path) {
            Ok(url) => targets.push(url),
            Err(e) => {
                tracing::debug!(target: "dynamic_fetch", "[{}] Bad dynamic path '{}': {}", website, path, e)
            }
        }
    }

    let mut page_hits = Vec::new();
    let mut network_hits = Vec::new();

    for target in targets {
        let mut page = match session.open_page().await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(target: "dynamic_fetch", "[{}] Could not open page for {}: {}", website, target, e);
                continue;
            }
        };

        let (content_hits, response_hits) =
            visit(page.as_mut(), &target, extractor, config, website).await;
        page.close().await;

        tracing::debug!(
            target: "dynamic_fetch",
            "[{}] {} -> {} page / {} network candidate(s)",
            website,
            target,
            content_hits.len(),
            response_hits.len()
        );
        page_hits.extend(content_hits);
        network_hits.extend(response_hits);

        if is_selectable(&page_hits) {
            break;
        }
    }

    page_hits.extend(network_hits);
    page_hits
}

/// Loads one target and returns its content hits and network hits.
///
/// Captured responses are drained even when navigation or rendering fails.
async fn visit(
    page: &mut dyn BrowserPage,
    url: &Url,
    extractor: &CandidateExtractor,
    config: &Config,
    website: &str,
) -> (Vec<Candidate>, Vec<Candidate>) {
    let content_hits = match render(page, url, config).await {
        Ok(content) => extractor.extract(&content, StrategyTag::Dynamic, website),
        Err(e) => {
            tracing::debug!(target: "dynamic_fetch", "[{}] Visit to {} failed: {}", website, url, e);
            Vec::new()
        }
    };

    let response_hits = match page.network_responses().await {
        Ok(responses) => responses
            .iter()
            .filter(|r| r.is_scannable())
            .flat_map(|r| extractor.extract(&r.body, StrategyTag::Dynamic, website))
            .collect(),
        Err(e) => {
            tracing::debug!(target: "dynamic_fetch", "[{}] Could not read captured responses: {}", website, e);
            Vec::new()
        }
    };

    (content_hits, response_hits)
}

async fn render(page: &mut dyn BrowserPage, url: &Url, config: &Config) -> Result<String> {
    page.goto(url, config.navigation_timeout).await?;
    page.scroll_to_bottom().await?;
    tokio::time::sleep(config.settle_delay).await;
    page.content().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::select_best;
    use crate::testing::{MockBrowserSession, MockPage};

    fn config() -> Config {
        Config {
            settle_delay: Duration::from_millis(0),
            ..Config::default()
        }
    }

    #[test]
    fn scannable_content_types() {
        let response = |ct: &str| NetworkResponse {
            content_type: ct.to_string(),
            body: String::new(),
        };
        assert!(response("application/json; charset=utf-8").is_scannable());
        assert!(response("text/html").is_scannable());
        assert!(response("Application/JSON").is_scannable());
        assert!(!response("image/png").is_scannable());
        assert!(!response("").is_scannable());
    }

    #[tokio::test]
    async fn missing_website_opens_no_pages() {
        let session = MockBrowserSession::new();
        let extractor = CandidateExtractor::default();
        assert!(fetch_dynamic(&session, &extractor, &config(), Some("N/A")).await.is_empty());
        assert!(fetch_dynamic(&session, &extractor, &config(), None).await.is_empty());
        assert_eq!(session.pages_opened(), 0);
    }

    #[tokio::test]
    async fn stops_once_rendered_content_is_selectable() {
        let session = MockBrowserSession::new().with_page(
            "http://dohasmile.qa/",
            MockPage::rendering(r#"<a href="mailto:info@dohasmile.qa">Email</a>"#),
        );
        let extractor = CandidateExtractor::default();

        let hits = fetch_dynamic(&session, &extractor, &config(), Some("dohasmile.qa")).await;

        assert_eq!(select_best(&hits), Some("info@dohasmile.qa"));
        assert_eq!(session.visited(), vec!["http://dohasmile.qa/"]);
        assert_eq!(session.pages_closed(), 1);
    }

    #[tokio::test]
    async fn network_hits_follow_page_hits_and_do_not_stop_the_visit() {
        let session = MockBrowserSession::new().with_page(
            "https://clinic.qa/",
            MockPage::rendering("<p>Loading...</p>")
                .responding("application/json", r#"{"email":"care@clinic.qa"}"#)
                .responding("image/png", "logo hello@clinic.qa"),
        );
        let extractor = CandidateExtractor::default();

        let hits = fetch_dynamic(&session, &extractor, &config(), Some("https://clinic.qa")).await;

        // Network hits alone never cut the visit short.
        assert_eq!(session.visited().len(), 3);
        assert!(hits.iter().any(|c| c.email == "care@clinic.qa"));
        assert!(!hits.iter().any(|c| c.email == "hello@clinic.qa"));
        assert_eq!(select_best(&hits), Some("care@clinic.qa"));
    }

    #[tokio::test]
    async fn failed_navigation_still_closes_page() {
        let session = MockBrowserSession::new()
            .with_page("http://clinic.qa/", MockPage::failing_navigation())
            .with_page(
                "http://clinic.qa/contact",
                MockPage::rendering("Reach reception@clinic.qa any time"),
            );
        let extractor = CandidateExtractor::default();

        let hits = fetch_dynamic(&session, &extractor, &config(), Some("clinic.qa")).await;

        assert_eq!(select_best(&hits), Some("reception@clinic.qa"));
        assert_eq!(session.pages_opened(), 2);
        assert_eq!(session.pages_closed(), 2);
    }

    #[tokio::test]
    async fn responses_captured_before_a_failed_navigation_are_kept() {
        let session = MockBrowserSession::new().with_page(
            "http://clinic.qa/",
            MockPage::failing_navigation().responding("application/json", r#"{"email":"info@clinic.qa"}"#),
        );
        let extractor = CandidateExtractor::default();

        let hits = fetch_dynamic(&session, &extractor, &config(), Some("clinic.qa")).await;

        assert!(hits
            .iter()
            .any(|c| c.email == "info@clinic.qa" && c.strategy == StrategyTag::Dynamic));
        assert_eq!(select_best(&hits), Some("info@clinic.qa"));
        assert_eq!(session.pages_closed(), session.pages_opened());
    }
}
