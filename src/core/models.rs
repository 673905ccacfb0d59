//! Data structures shared across the resolution engine and the collector.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which extraction technique produced a candidate. Used as a trust signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    Mailto,
    CloudflareObfuscated,
    SchemaOrg,
    TextObfuscated,
    RawRegex,
    /// Browser-rendered DOM content and intercepted network bodies.
    Dynamic,
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyTag::Mailto => "mailto",
            StrategyTag::CloudflareObfuscated => "cf",
            StrategyTag::SchemaOrg => "schema",
            StrategyTag::TextObfuscated => "obfuscated",
            StrategyTag::RawRegex => "regex",
            StrategyTag::Dynamic => "dynamic",
        };
        f.write_str(label)
    }
}

/// A scored email candidate. Only built by the extractor, after scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub email: String,
    pub strategy: StrategyTag,
    pub score: i32,
}

/// A business as returned by the discovery feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BusinessDescriptor {
    pub name: String,
    pub website: Option<String>,
    pub phone: String,
    pub address: String,
}

impl BusinessDescriptor {
    pub fn new(name: impl Into<String>, website: Option<&str>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            website: website
                .map(str::trim)
                .filter(|w| !w.is_empty() && *w != "N/A")
                .map(str::to_string),
            phone: String::new(),
            address: String::new(),
        }
    }
}

/// One page of discovery results.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryPage {
    pub businesses: Vec<BusinessDescriptor>,
    pub next_page_token: Option<String>,
}

/// Final output unit, one per unique company name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Address")]
    pub address: String,
}

impl Record {
    pub fn from_resolution(business: BusinessDescriptor, resolution: &Resolution) -> Self {
        Self {
            company_name: business.name.trim().to_string(),
            website: business.website.unwrap_or_default().trim().to_string(),
            email: resolution.email_or_empty().trim().to_string(),
            phone: business.phone.trim().to_string(),
            address: business.address.trim().to_string(),
        }
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }
}

/// Cursor over the configured query list and the provider's page tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    pub query_index: usize,
    pub page_token: Option<String>,
}

impl PaginationState {
    /// Moves to the next page of the current query, or to the next query when
    /// the provider returned no token.
    pub fn advance(&mut self, next_token: Option<String>) {
        match next_token.filter(|t| !t.is_empty()) {
            Some(token) => self.page_token = Some(token),
            None => self.next_query(),
        }
    }

    pub fn next_query(&mut self) {
        self.query_index += 1;
        self.page_token = None;
    }
}

/// Result of a single plain-HTTP probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    Body(String),
    Status(u16),
    Failed(String),
}

/// The three cascade stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStage {
    Static,
    Dynamic,
    Fallback,
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionStage::Static => f.write_str("static"),
            ResolutionStage::Dynamic => f.write_str("dynamic"),
            ResolutionStage::Fallback => f.write_str("fallback"),
        }
    }
}

/// Outcome of one cascade stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Found(String),
    NoCandidate,
    /// The stage could not run (no website, no browser, no search provider).
    Unavailable(String),
}

impl StageOutcome {
    pub fn email(&self) -> Option<&str> {
        match self {
            StageOutcome::Found(email) => Some(email),
            _ => None,
        }
    }
}

/// What the cascade produced for one business.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub email: Option<String>,
    pub stage: Option<ResolutionStage>,
    pub outcomes: Vec<(ResolutionStage, StageOutcome)>,
}

impl Resolution {
    pub fn email_or_empty(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }

    pub(crate) fn record(&mut self, stage: ResolutionStage, outcome: StageOutcome) -> bool {
        let found = outcome.email().map(str::to_string);
        self.outcomes.push((stage, outcome));
        if let Some(email) = found {
            self.email = Some(email);
            self.stage = Some(stage);
            true
        } else {
            false
        }
    }
}

/// End-of-run counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub with_email: usize,
}

impl RunSummary {
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            records: records.len(),
            with_email: records.iter().filter(|r| r.has_email()).count(),
        }
    }

    /// Percentage of records with an email; 0 for an empty run.
    pub fn hit_rate(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            self.with_email as f64 * 100.0 / self.records as f64
        }
    }
}
