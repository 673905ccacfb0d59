//! Plain-HTTP probing of a business website and its likely contact pages.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{Candidate, PageFetch, StrategyTag};
use crate::extraction::CandidateExtractor;
use crate::scoring::is_selectable;
use crate::utils::domain::{is_missing_website, normalize_website, site_origin};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

/// Something that can GET a page. Never fails: every problem is a `PageFetch` variant.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, url: &Url) -> PageFetch;
}

/// `PageSource` over a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;
        tracing::debug!("HTTP page source initialized.");
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get(&self, url: &Url) -> PageFetch {
        match self.client.get(url.clone()).send().await {
            Ok(response) if response.status() == StatusCode::OK => match response.text().await {
                Ok(body) => PageFetch::Body(body),
                Err(e) => PageFetch::Failed(format!("failed to read body: {}", e)),
            },
            Ok(response) => PageFetch::Status(response.status().as_u16()),
            Err(e) if e.is_timeout() => PageFetch::Failed(format!("timed out: {}", e)),
            Err(e) => PageFetch::Failed(e.to_string()),
        }
    }
}

/// Probes the site origin and then each configured contact path, stopping as
/// soon as the accumulated hits hold a selectable candidate.
///
/// A missing website yields nothing. Per-path failures are logged and skipped.
pub async fn fetch_static(
    source: &dyn PageSource,
    extractor: &CandidateExtractor,
    config: &Config,
    website: Option<&str>,
) -> Vec<Candidate> {
    let website = match website {
        Some(w) if !is_missing_website(w) => w,
        _ => return Vec::new(),
    };

    let origin = match normalize_website(website).and_then(|url| site_origin(&url)) {
        Ok(origin) => origin,
        Err(e) => {
            tracing::debug!(target: "static_fetch", "[{}] Unusable website: {}", website, e);
            return Vec::new();
        }
    };

    let mut hits = Vec::new();
    let paths = std::iter::once("").chain(config.contact_paths.iter().map(String::as_str));

    for path in paths {
        let url = match origin.join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(target: "static_fetch", "[{}] Bad contact path '{}': {}", website, path, e);
                continue;
            }
        };

        match source.get(&url).await {
            PageFetch::Body(body) => {
                let found = extractor.extract(&body, StrategyTag::RawRegex, website);
                tracing::debug!(target: "static_fetch", "[{}] {} -> {} candidate(s)", website, url, found.len());
                hits.extend(found);
                if is_selectable(&hits) {
                    tracing::trace!(target: "static_fetch", "[{}] Selectable candidate found, stopping early", website);
                    break;
                }
            }
            PageFetch::Status(status) => {
                tracing::trace!(target: "static_fetch", "[{}] {} returned status {}", website, url, status);
            }
            PageFetch::Failed(reason) => {
                tracing::debug!(target: "static_fetch", "[{}] {} failed: {}", website, url, reason);
            }
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::select_best;
    use crate::testing::MockPageSource;

    fn config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn missing_website_makes_no_requests() {
        let source = MockPageSource::new();
        let extractor = CandidateExtractor::default();
        assert!(fetch_static(&source, &extractor, &config(), None).await.is_empty());
        assert!(fetch_static(&source, &extractor, &config(), Some("N/A")).await.is_empty());
        assert!(fetch_static(&source, &extractor, &config(), Some("  ")).await.is_empty());
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn stops_after_first_selectable_page() {
        let source = MockPageSource::new()
            .with_page("http://dohasmile.qa/", "<p>Welcome</p>")
            .with_page(
                "http://dohasmile.qa/contact",
                r#"<a href="mailto:info@dohasmile.qa">mail</a>"#,
            );
        let extractor = CandidateExtractor::default();

        let hits = fetch_static(&source, &extractor, &config(), Some("dohasmile.qa")).await;

        assert_eq!(select_best(&hits), Some("info@dohasmile.qa"));
        assert_eq!(
            source.requested(),
            vec!["http://dohasmile.qa/", "http://dohasmile.qa/contact"]
        );
    }

    #[tokio::test]
    async fn probes_from_origin_and_survives_failures() {
        // Nothing registered: every request is a 404 or a failure.
        let source = MockPageSource::new().failing("https://clinic.qa/about");
        let extractor = CandidateExtractor::default();

        let hits = fetch_static(
            &source,
            &extractor,
            &config(),
            Some("https://clinic.qa/en/home"),
        )
        .await;

        assert!(hits.is_empty());
        let requested = source.requested();
        assert_eq!(requested.len(), 1 + config().contact_paths.len());
        assert_eq!(requested[0], "https://clinic.qa/");
        assert!(requested.contains(&"https://clinic.qa/ar/contact".to_string()));
    }

    #[tokio::test]
    async fn junk_only_site_is_not_selectable() {
        let source = MockPageSource::new().with_page(
            "http://clinic.qa/",
            "<script>Sentry.init({dsn: 'tracker@sentry.io'})</script>",
        );
        let extractor = CandidateExtractor::default();

        let hits = fetch_static(&source, &extractor, &config(), Some("clinic.qa")).await;

        assert!(hits.iter().any(|c| c.email == "tracker@sentry.io" && c.score == -100));
        assert_eq!(select_best(&hits), None);
        assert_eq!(source.requested().len(), 1 + config().contact_paths.len());
    }
}
