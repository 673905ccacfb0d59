//! The per-business resolution cascade: static, then dynamic, then fallback.

use crate::core::config::Config;
use crate::core::models::{BusinessDescriptor, Resolution, ResolutionStage, StageOutcome};
use crate::extraction::CandidateExtractor;
use crate::fetch::{fallback_resolve, fetch_dynamic, fetch_static, BrowserSession, PageSource};
use crate::providers::WebSearch;
use crate::scoring::select_best;

use std::sync::Arc;

/// Resolves one business to at most one email. Cheap to clone and share
/// across tasks.
#[derive(Clone)]
pub struct ContactResolver {
    config: Arc<Config>,
    extractor: Arc<CandidateExtractor>,
    pages: Arc<dyn PageSource>,
    search: Option<Arc<dyn WebSearch>>,
}

impl ContactResolver {
    pub fn new(
        config: Arc<Config>,
        extractor: Arc<CandidateExtractor>,
        pages: Arc<dyn PageSource>,
        search: Option<Arc<dyn WebSearch>>,
    ) -> Self {
        Self {
            config,
            extractor,
            pages,
            search,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the stages strictly in order and stops at the first email.
    ///
    /// Without a browser session the dynamic stage is reported as
    /// unavailable; the same goes for the fallback stage without a search
    /// provider.
    pub async fn resolve(
        &self,
        session: Option<&dyn BrowserSession>,
        business: &BusinessDescriptor,
    ) -> Resolution {
        let label = business.name.as_str();
        let website = business.website.as_deref();
        let mut resolution = Resolution::default();

        let hits = fetch_static(self.pages.as_ref(), &self.extractor, &self.config, website).await;
        if resolution.record(ResolutionStage::Static, outcome(select_best(&hits))) {
            return self.finish(label, resolution);
        }

        let dynamic = match (session, website) {
            (Some(session), Some(_)) => {
                let hits = fetch_dynamic(session, &self.extractor, &self.config, website).await;
                outcome(select_best(&hits))
            }
            (None, _) => StageOutcome::Unavailable("no browser session".to_string()),
            (_, None) => StageOutcome::Unavailable("no website".to_string()),
        };
        if resolution.record(ResolutionStage::Dynamic, dynamic) {
            return self.finish(label, resolution);
        }

        let fallback = match &self.search {
            Some(search) => outcome(
                fallback_resolve(search.as_ref(), &self.extractor, &self.config, label)
                    .await
                    .as_deref(),
            ),
            None => StageOutcome::Unavailable("no search provider".to_string()),
        };
        resolution.record(ResolutionStage::Fallback, fallback);
        self.finish(label, resolution)
    }

    fn finish(&self, label: &str, resolution: Resolution) -> Resolution {
        match (&resolution.email, resolution.stage) {
            (Some(email), Some(stage)) => {
                tracing::debug!(target: "resolve_task", "[{}] Resolved {} via {} stage", label, email, stage)
            }
            _ => tracing::debug!(target: "resolve_task", "[{}] No email found", label),
        }
        resolution
    }
}

fn outcome(email: Option<&str>) -> StageOutcome {
    match email {
        Some(email) => StageOutcome::Found(email.to_string()),
        None => StageOutcome::NoCandidate,
    }
}
