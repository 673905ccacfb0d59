//! The paginated collection pipeline.

use crate::core::config::Config;
use crate::core::error::AppError;
use crate::core::models::{BusinessDescriptor, PaginationState, Record};
use crate::core::resolver::ContactResolver;
use crate::fetch::{BrowserDriver, BrowserSession};
use crate::providers::DiscoveryFeed;

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Walks the discovery feed page by page and resolves every new business
/// until the target number of records is reached or the queries run out.
pub struct Collector {
    config: Arc<Config>,
    feed: Arc<dyn DiscoveryFeed>,
    resolver: ContactResolver,
    browser: Option<Arc<dyn BrowserDriver>>,
}

impl Collector {
    pub fn new(
        config: Arc<Config>,
        feed: Arc<dyn DiscoveryFeed>,
        resolver: ContactResolver,
        browser: Option<Arc<dyn BrowserDriver>>,
    ) -> Self {
        Self {
            config,
            feed,
            resolver,
            browser,
        }
    }

    pub async fn collect(&self, target: usize) -> Vec<Record> {
        self.collect_with(target, |_, _| {}).await
    }

    /// Like [`Collector::collect`], calling `on_accept` with each accepted
    /// record and the running count.
    pub async fn collect_with<F>(&self, target: usize, mut on_accept: F) -> Vec<Record>
    where
        F: FnMut(&Record, usize),
    {
        let queries = &self.config.search_queries;
        // One limiter for the whole run, shared by every page.
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut state = PaginationState::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut records: Vec<Record> = Vec::new();

        while records.len() < target && state.query_index < queries.len() {
            let query = &queries[state.query_index];
            tracing::info!(target: "collector", "[{}/{}] Query: {}", records.len(), target, query);

            let page = match self
                .feed
                .fetch_page(query, state.page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(target: "collector", "Discovery request for '{}' failed, moving to next query: {}", query, e);
                    state.next_query();
                    continue;
                }
            };

            if page.businesses.is_empty() {
                tracing::debug!(target: "collector", "No results for '{}', moving to next query", query);
                state.next_query();
                continue;
            }

            self.process_page(
                page.businesses,
                target,
                &semaphore,
                &mut seen,
                &mut records,
                &mut on_accept,
            )
            .await;

            state.advance(page.next_page_token);

            if records.len() < target && state.query_index < queries.len() {
                tokio::time::sleep(self.config.page_pacing).await;
            }
        }

        tracing::info!(target: "collector", "Collection finished with {} record(s)", records.len());
        records
    }

    async fn process_page<F>(
        &self,
        businesses: Vec<BusinessDescriptor>,
        target: usize,
        semaphore: &Arc<Semaphore>,
        seen: &mut HashSet<String>,
        records: &mut Vec<Record>,
        on_accept: &mut F,
    ) where
        F: FnMut(&Record, usize),
    {
        let sessions = self.open_sessions(businesses.len()).await;
        let mut tasks = FuturesUnordered::new();
        let mut in_flight: HashSet<String> = HashSet::new();

        for (index, business) in businesses.into_iter().enumerate() {
            if business.name.is_empty()
                || seen.contains(&business.name)
                || !in_flight.insert(business.name.clone())
            {
                tracing::trace!(target: "collector", "Skipping '{}' (empty, collected or in flight)", business.name);
                continue;
            }

            let session = match sessions.len() {
                0 => None,
                n => Some(Arc::clone(&sessions[index % n])),
            };
            let resolver = self.resolver.clone();
            let semaphore = Arc::clone(semaphore);

            tasks.push(tokio::spawn(async move {
                // Released on drop, whether the task finishes, fails or unwinds.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Task(format!("concurrency limiter closed: {}", e)))?;
                let resolution = resolver.resolve(session.as_deref(), &business).await;
                Ok::<Record, AppError>(Record::from_resolution(business, &resolution))
            }));
        }

        while let Some(joined) = tasks.next().await {
            let record = match joined {
                Ok(Ok(record)) => record,
                Ok(Err(e)) => {
                    tracing::warn!(target: "collector", "Resolution task failed: {}", e);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(target: "collector", "Resolution task panicked: {}", e);
                    continue;
                }
            };

            if records.len() >= target || seen.contains(&record.company_name) {
                continue;
            }
            seen.insert(record.company_name.clone());
            records.push(record);

            let count = records.len();
            let accepted = &records[count - 1];
            tracing::info!(
                target: "collector",
                "  [{}/{}] {} | {}",
                count,
                target,
                accepted.company_name,
                if accepted.has_email() { accepted.email.as_str() } else { "-" }
            );
            on_accept(accepted, count);

            if count == target && !tasks.is_empty() {
                tracing::debug!(target: "collector", "Target reached, letting {} outstanding task(s) finish", tasks.len());
            }
        }

        for session in sessions {
            session.close().await;
        }
    }

    /// One session per concurrent slot, but never more than the page has
    /// results. Sessions that fail to open are skipped.
    async fn open_sessions(&self, page_len: usize) -> Vec<Arc<dyn BrowserSession>> {
        let Some(browser) = &self.browser else {
            return Vec::new();
        };
        let wanted = self.config.max_concurrency.min(page_len);
        let opened = futures::future::join_all((0..wanted).map(|_| browser.open_session())).await;

        let mut sessions = Vec::with_capacity(wanted);
        for result in opened {
            match result {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::warn!(target: "collector", "Could not open browser session: {}", e),
            }
        }
        if sessions.is_empty() && wanted > 0 {
            tracing::warn!(target: "collector", "No browser sessions available; dynamic stage disabled for this page");
        }
        sessions
    }
}
