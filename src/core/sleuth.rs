use crate::core::collector::Collector;
use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{BusinessDescriptor, Resolution};
use crate::core::resolver::ContactResolver;
use crate::extraction::CandidateExtractor;
use crate::fetch::{BrowserDriver, HttpPageSource, PageSource, WebDriverBrowser};
use crate::providers::{DiscoveryFeed, SerpApiClient, WebSearch};
use crate::scoring::Scorer;

use std::sync::Arc;

/// Holds the collaborators built from one `Config`: the resolver and, when
/// configured, the discovery feed and the browser.
#[derive(Clone)]
pub struct ContactSleuth {
    config: Arc<Config>,
    resolver: ContactResolver,
    feed: Option<Arc<dyn DiscoveryFeed>>,
    browser: Option<Arc<dyn BrowserDriver>>,
}

impl ContactSleuth {
    /// Builds the production stack: reqwest for pages, SerpApi for discovery
    /// and search, and WebDriver for the dynamic stage.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        tracing::debug!("Initializing ContactSleuth components...");
        let pages: Arc<dyn PageSource> = Arc::new(HttpPageSource::new(&config)?);

        let serpapi = match config.serpapi_key {
            Some(_) => Some(Arc::new(SerpApiClient::new(&config)?)),
            None => {
                tracing::warn!("No SerpApi key: discovery and fallback search are disabled.");
                None
            }
        };

        let browser = WebDriverBrowser::new(&config).map(|b| Arc::new(b) as Arc<dyn BrowserDriver>);
        if browser.is_none() {
            tracing::warn!("No WebDriver URL: the dynamic stage is disabled.");
        }

        let sleuth = Self::from_parts(
            config,
            pages,
            serpapi.clone().map(|s| s as Arc<dyn DiscoveryFeed>),
            serpapi.map(|s| s as Arc<dyn WebSearch>),
            browser,
        );
        tracing::info!("ContactSleuth initialized successfully.");
        Ok(sleuth)
    }

    pub fn from_parts(
        config: Arc<Config>,
        pages: Arc<dyn PageSource>,
        feed: Option<Arc<dyn DiscoveryFeed>>,
        search: Option<Arc<dyn WebSearch>>,
        browser: Option<Arc<dyn BrowserDriver>>,
    ) -> Self {
        let extractor = Arc::new(CandidateExtractor::new(Scorer::new(config.scoring.clone())));
        let resolver = ContactResolver::new(config.clone(), extractor, pages, search);
        Self {
            config,
            resolver,
            feed,
            browser,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &ContactResolver {
        &self.resolver
    }

    /// Fails when there is no discovery feed to collect from.
    pub fn collector(&self) -> Result<Collector> {
        let feed = self.feed.clone().ok_or_else(|| {
            AppError::Config("Collection needs a SerpApi key for the discovery feed".to_string())
        })?;
        Ok(Collector::new(
            self.config.clone(),
            feed,
            self.resolver.clone(),
            self.browser.clone(),
        ))
    }

    /// Runs the cascade for one business with a session of its own.
    pub async fn resolve_business(&self, business: &BusinessDescriptor) -> Resolution {
        let session = match &self.browser {
            Some(browser) => match browser.open_session().await {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Could not open browser session, skipping dynamic stage: {}", e);
                    None
                }
            },
            None => None,
        };

        let resolution = self.resolver.resolve(session.as_deref(), business).await;

        if let Some(session) = session {
            session.close().await;
        }
        resolution
    }
}
