//! Last-resort lookup through a web search for the business name.

use crate::core::config::Config;
use crate::core::models::StrategyTag;
use crate::extraction::CandidateExtractor;
use crate::providers::WebSearch;
use crate::scoring::select_best;

pub(crate) fn fallback_query(business_name: &str, country_qualifier: &str) -> String {
    format!("\"{}\" email contact {}", business_name, country_qualifier)
        .trim_end()
        .to_string()
}

/// Searches for the business and picks the best email out of the result
/// snippets. Every failure is `None`.
pub async fn fallback_resolve(
    search: &dyn WebSearch,
    extractor: &CandidateExtractor,
    config: &Config,
    business_name: &str,
) -> Option<String> {
    let query = fallback_query(business_name, &config.country_qualifier);

    let snippets = match search.snippets(&query, config.fallback_result_count).await {
        Ok(snippets) => snippets,
        Err(e) => {
            tracing::debug!(target: "fallback", "[{}] Search failed: {}", business_name, e);
            return None;
        }
    };

    let text = snippets.join(" ");
    let candidates = extractor.extract(&text, StrategyTag::RawRegex, "");
    let best = select_best(&candidates).map(str::to_string);

    tracing::debug!(
        target: "fallback",
        "[{}] {} snippet(s), {} candidate(s), selected {:?}",
        business_name,
        snippets.len(),
        candidates.len(),
        best
    );
    best
}
