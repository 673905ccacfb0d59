//! Candidate extraction: runs every matcher over a piece of content and
//! scores what they find.

mod matchers;

pub use matchers::{
    decode_cf, AnchorMailtoMatcher, CloudflareMatcher, MailtoTextMatcher, RawEmailMatcher,
    SchemaOrgMatcher, TextObfuscatedMatcher,
};

use crate::core::models::{Candidate, StrategyTag};
use crate::scoring::Scorer;
use crate::utils::domain::host_for_matching;

use thiserror::Error;

/// An unscored match, straight out of a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHit {
    pub email: String,
    pub strategy: StrategyTag,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("malformed match: {0}")]
    Malformed(String),
}

/// One way of finding email-like strings in text.
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns every hit in `content`. `default_strategy` is the tag for
    /// matchers that have no technique of their own.
    fn find(
        &self,
        content: &str,
        default_strategy: StrategyTag,
    ) -> Result<Vec<RawHit>, ExtractionError>;
}

/// Runs an ordered list of matchers and scores the surviving hits.
pub struct CandidateExtractor {
    matchers: Vec<Box<dyn Matcher>>,
    scorer: Scorer,
}

impl CandidateExtractor {
    /// The six built-in matchers, in their fixed order.
    pub fn new(scorer: Scorer) -> Self {
        Self {
            matchers: vec![
                Box::new(MailtoTextMatcher),
                Box::new(CloudflareMatcher),
                Box::new(SchemaOrgMatcher),
                Box::new(TextObfuscatedMatcher),
                Box::new(RawEmailMatcher),
                Box::new(AnchorMailtoMatcher),
            ],
            scorer,
        }
    }

    /// Appends another matcher after the built-in ones.
    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Extracts and scores candidates from `content`.
    ///
    /// Matcher outputs are concatenated without deduplication. Hits without an
    /// `@` are dropped before scoring. A failing matcher is logged and skipped.
    pub fn extract(
        &self,
        content: &str,
        default_strategy: StrategyTag,
        website_hint: &str,
    ) -> Vec<Candidate> {
        let host = host_for_matching(website_hint);
        let mut candidates = Vec::new();

        for matcher in &self.matchers {
            let hits = match matcher.find(content, default_strategy) {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::debug!(target: "extraction", "Matcher '{}' failed, skipping: {}", matcher.name(), e);
                    continue;
                }
            };
            candidates.extend(hits.into_iter().filter(|h| h.email.contains('@')).map(|h| {
                let score = self.scorer.score_against_host(&h.email, h.strategy, &host);
                Candidate {
                    email: h.email,
                    strategy: h.strategy,
                    score,
                }
            }));
        }

        tracing::trace!(target: "extraction", "Extracted {} candidate(s) for '{}'", candidates.len(), website_hint);
        candidates
    }
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self::new(Scorer::default())
    }
}
