//! Contains validation logic for the final Config struct.

use super::{Config, Result};
use crate::core::error::AppError;

/// Validates the configuration after loading and overrides.
/// Clamps or normalizes values where that is unambiguous, rejects the rest.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.max_concurrency == 0 {
        tracing::warn!("Max concurrency was set to 0. Setting to 1.");
        config.max_concurrency = 1;
    }
    if config.target_count == 0 {
        tracing::warn!("Target count is 0; collection will return immediately.");
    }

    config.search_queries = config
        .search_queries
        .iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if config.search_queries.is_empty() {
        return Err(AppError::Config(
            "At least one discovery search query is required.".to_string(),
        ));
    }

    for path in config
        .contact_paths
        .iter_mut()
        .chain(config.dynamic_paths.iter_mut())
    {
        if !path.starts_with('/') {
            *path = format!("/{}", path);
        }
    }

    let tld = config
        .scoring
        .country_tld
        .trim()
        .trim_start_matches('.')
        .to_lowercase();
    if tld.is_empty() {
        return Err(AppError::Config("Country TLD cannot be empty.".to_string()));
    }
    config.scoring.country_tld = tld;
    config.scoring.generic_tlds = config
        .scoring
        .generic_tlds
        .iter()
        .map(|t| t.trim().trim_start_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    if config.fallback_result_count == 0 {
        tracing::warn!("Fallback result count was 0. Setting to 1.");
        config.fallback_result_count = 1;
    }

    if let Some(ref url) = config.webdriver_url {
        if url::Url::parse(url).is_err() {
            return Err(AppError::Config(format!("Invalid WebDriver URL: {}", url)));
        }
    } else {
        tracing::debug!("No WebDriver URL configured; dynamic fetching is disabled.");
    }

    if config.serpapi_key.is_none() {
        tracing::warn!("No SerpApi key configured; discovery and search fallback are unavailable.");
    }

    Ok(())
}
