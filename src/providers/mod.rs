//! External search providers: the paginated business discovery feed and the
//! web search used by the fallback stage.

mod serpapi;

pub use serpapi::SerpApiClient;

use crate::core::error::Result;
use crate::core::models::DiscoveryPage;

use async_trait::async_trait;

/// Paginated source of business descriptors.
#[async_trait]
pub trait DiscoveryFeed: Send + Sync {
    /// Fetches one page of results. A `None` token means the first page.
    async fn fetch_page(&self, query: &str, page_token: Option<&str>) -> Result<DiscoveryPage>;
}

/// Web search returning plain-text result snippets.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn snippets(&self, query: &str, count: usize) -> Result<Vec<String>>;
}
