//! # Contact Sleuth Core Library
//!
//! Finds a public contact email for local businesses. A discovery feed lists
//! businesses page by page; each one goes through a resolution cascade
//! (plain HTTP scrape, then a headless browser, then a web search) and every
//! candidate found along the way is scored for trust before one is picked.
//!
//! It is designed to be used either directly as a library or via the
//! `contact-sleuth` command-line tool.

mod core;
mod extraction;
mod fetch;
mod providers;
mod scoring;
mod utils;

#[cfg(test)]
mod testing;

pub use crate::core::collector::Collector;
pub use crate::core::config::{Config, ConfigBuilder, ConfigFile, ScoringConfig};
pub use crate::core::error::{AppError, Result};
pub use crate::core::export::{write_csv, write_csv_file, CSV_HEADERS};
pub use crate::core::models::{
    BusinessDescriptor, Candidate, DiscoveryPage, PageFetch, PaginationState, Record, Resolution,
    ResolutionStage, RunSummary, StageOutcome, StrategyTag,
};
pub use crate::core::resolver::ContactResolver;
pub use crate::core::sleuth::ContactSleuth;
pub use crate::extraction::{decode_cf, CandidateExtractor, ExtractionError, Matcher, RawHit};
pub use crate::fetch::{
    fallback_resolve, fetch_dynamic, fetch_static, BrowserDriver, BrowserPage, BrowserSession,
    HttpPageSource, NetworkResponse, PageSource, WebDriverBrowser,
};
pub use crate::providers::{DiscoveryFeed, SerpApiClient, WebSearch};
pub use crate::scoring::{is_selectable, select_best, Scorer, SELECTION_FLOOR};

use std::sync::Arc;

/// Builds the production collaborators for `config`.
pub fn initialize_sleuth(config: Arc<Config>) -> Result<ContactSleuth> {
    ContactSleuth::new(config)
}

/// Runs the cascade for a single business given by name and website.
///
/// Returns the chosen email, or an empty string when every stage came up
/// empty, together with the full per-stage trail.
pub async fn find_business_email(
    sleuth: &ContactSleuth,
    name: &str,
    website: Option<&str>,
) -> Resolution {
    let business = BusinessDescriptor::new(name, website);
    tracing::info!(target: "resolve_task", "[{}] Resolving (website: {})", business.name, business.website.as_deref().unwrap_or("N/A"));
    sleuth.resolve_business(&business).await
}

/// Collects up to `target` records, reporting each accepted record to
/// `on_accept` with the running count.
pub async fn collect_records<F>(sleuth: &ContactSleuth, target: usize, on_accept: F) -> Result<Vec<Record>>
where
    F: FnMut(&Record, usize),
{
    let collector = sleuth.collector()?;
    Ok(collector.collect_with(target, on_accept).await)
}
