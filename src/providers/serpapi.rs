//! SerpApi client: Google Maps local results for discovery, Google organic
//! results for the fallback search.

use super::{DiscoveryFeed, WebSearch};
use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{BusinessDescriptor, DiscoveryPage};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct MapsResponse {
    #[serde(default)]
    local_results: Vec<LocalResult>,
    #[serde(default)]
    serpapi_pagination: Option<Pagination>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    snippet: Option<String>,
}

impl From<LocalResult> for BusinessDescriptor {
    fn from(result: LocalResult) -> Self {
        let mut business =
            BusinessDescriptor::new(result.title.unwrap_or_default(), result.website.as_deref());
        business.phone = result.phone.unwrap_or_default().trim().to_string();
        business.address = result.address.unwrap_or_default().trim().to_string();
        business
    }
}

impl From<MapsResponse> for DiscoveryPage {
    fn from(response: MapsResponse) -> Self {
        DiscoveryPage {
            businesses: response
                .local_results
                .into_iter()
                .map(BusinessDescriptor::from)
                .collect(),
            next_page_token: response
                .serpapi_pagination
                .and_then(|p| p.next_page_token)
                .filter(|t| !t.is_empty()),
        }
    }
}

/// SerpApi over HTTPS. Implements both [`DiscoveryFeed`] and [`WebSearch`].
#[derive(Clone)]
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    geo_anchor: String,
    language: String,
    discovery_timeout: Duration,
    search_timeout: Duration,
}

impl SerpApiClient {
    /// Fails when no API key is configured.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .serpapi_key
            .clone()
            .ok_or_else(|| AppError::Config("No SerpApi key configured".to_string()))?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: config.serpapi_endpoint.clone(),
            geo_anchor: config.geo_anchor.clone(),
            language: config.language.clone(),
            discovery_timeout: config.discovery_timeout,
            search_timeout: config.fallback_timeout,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!(target: "serpapi", "Request timed out: {}", e);
                } else {
                    tracing::error!(target: "serpapi", "Request failed: {}", e);
                }
                AppError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(target: "serpapi", "SerpApi returned status {}", status);
            return Err(AppError::Discovery(format!(
                "SerpApi error {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl DiscoveryFeed for SerpApiClient {
    async fn fetch_page(&self, query: &str, page_token: Option<&str>) -> Result<DiscoveryPage> {
        let mut params = vec![
            ("engine", "google_maps"),
            ("q", query),
            ("ll", self.geo_anchor.as_str()),
            ("hl", self.language.as_str()),
            ("type", "search"),
        ];
        if let Some(token) = page_token {
            params.push(("next_page_token", token));
        }

        tracing::debug!(target: "serpapi", "Discovery request: q='{}' token={:?}", query, page_token);
        let response: MapsResponse = self.get_json(&params, self.discovery_timeout).await?;

        if let Some(error) = response.error.as_deref() {
            if response.local_results.is_empty() {
                return Err(AppError::Discovery(error.to_string()));
            }
        }

        let page = DiscoveryPage::from(response);
        tracing::debug!(
            target: "serpapi",
            "Discovery page: {} result(s), next token: {}",
            page.businesses.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }
}

#[async_trait]
impl WebSearch for SerpApiClient {
    async fn snippets(&self, query: &str, count: usize) -> Result<Vec<String>> {
        let num = count.to_string();
        let params = [("engine", "google"), ("q", query), ("num", num.as_str())];

        let response: SearchResponse = self.get_json(&params, self.search_timeout).await?;
        if let Some(error) = response.error {
            if response.organic_results.is_empty() {
                return Err(AppError::Search(error));
            }
        }

        Ok(response
            .organic_results
            .into_iter()
            .filter_map(|r| r.snippet)
            .collect())
    }
}
