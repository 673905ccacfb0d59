//! Runtime configuration.
//!
//! `Config` is immutable once built and is shared as `Arc<Config>`. Build it with
//! [`ConfigBuilder`], which layers defaults, an optional TOML file and explicit
//! overrides, then validates the result.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

pub(crate) use crate::core::error::Result;

use serde::Deserialize;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub const DEFAULT_SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

/// Scoring constants. The defaults are empirically tuned and kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub reject_score: i32,
    pub same_domain_bonus: i32,
    pub cross_domain_penalty: i32,
    pub mailto_weight: i32,
    pub schema_org_weight: i32,
    pub cloudflare_weight: i32,
    pub text_obfuscated_weight: i32,
    pub dynamic_weight: i32,
    pub raw_regex_weight: i32,
    pub role_account_bonus: i32,
    pub country_tld_bonus: i32,
    pub generic_tld_bonus: i32,
    pub numeric_noise_penalty: i32,
    pub numeric_noise_run: usize,
    pub country_tld: String,
    pub generic_tlds: Vec<String>,
    pub junk_keywords: Vec<String>,
    pub junk_domains: Vec<String>,
    pub noreply_prefixes: Vec<String>,
    pub role_prefixes: Vec<String>,
    pub binary_extensions: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reject_score: -100,
            same_domain_bonus: 50,
            cross_domain_penalty: -40,
            mailto_weight: 30,
            schema_org_weight: 28,
            cloudflare_weight: 26,
            text_obfuscated_weight: 20,
            dynamic_weight: 10,
            raw_regex_weight: 5,
            role_account_bonus: 20,
            country_tld_bonus: 15,
            generic_tld_bonus: 5,
            numeric_noise_penalty: -15,
            numeric_noise_run: 5,
            country_tld: "qa".to_string(),
            generic_tlds: strings(&["com", "org", "net"]),
            junk_keywords: strings(&[
                "font", "fonts", "icon", "cdn", "static", "image", "img", "asset", "pixel",
                "tracker",
            ]),
            junk_domains: strings(&[
                "sentry.io",
                "example.com",
                "wixpress.com",
                "amazonaws.com",
                "googletagmanager.com",
                "schema.org",
                "w3.org",
            ]),
            noreply_prefixes: strings(&[
                "noreply",
                "no-reply",
                "donotreply",
                "daemon",
                "bounce",
                "mailer",
            ]),
            role_prefixes: strings(&[
                "info",
                "contact",
                "admin",
                "hello",
                "support",
                "reception",
                "enquir",
            ]),
            binary_extensions: strings(&[".png", ".jpg", ".gif", ".svg", ".js", ".css"]),
        }
    }
}

/// Main configuration structure holding all settings.
#[derive(Debug, Clone)]
pub struct Config {
    // Network
    pub user_agent: String,
    pub request_timeout: Duration,
    pub discovery_timeout: Duration,
    pub fallback_timeout: Duration,

    // Collection
    pub target_count: usize,
    pub max_concurrency: usize,
    pub page_pacing: Duration,
    pub search_queries: Vec<String>,
    pub geo_anchor: String,
    pub language: String,

    // Resolution
    pub contact_paths: Vec<String>,
    pub dynamic_paths: Vec<String>,
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub country_qualifier: String,
    pub fallback_result_count: usize,

    // Collaborators
    pub webdriver_url: Option<String>,
    /// Bound on every WebDriver command other than navigation.
    pub browser_command_timeout: Duration,
    pub serpapi_key: Option<String>,
    pub serpapi_endpoint: String,

    pub scoring: ScoringConfig,

    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            discovery_timeout: Duration::from_secs(30),
            fallback_timeout: Duration::from_secs(12),

            target_count: 50,
            max_concurrency: 8,
            page_pacing: Duration::from_millis(1500),
            search_queries: strings(&[
                "hospital Qatar",
                "clinic Qatar",
                "medical center Qatar",
                "pharmacy Qatar",
                "polyclinic Qatar",
                "specialist clinic Doha",
                "dental clinic Qatar",
            ]),
            geo_anchor: "@25.2854,51.5310,11z".to_string(),
            language: "en".to_string(),

            contact_paths: strings(&[
                "/contact",
                "/contact-us",
                "/about",
                "/about-us",
                "/en/contact",
                "/ar/contact",
            ]),
            dynamic_paths: strings(&["/contact", "/contact-us"]),
            navigation_timeout: Duration::from_secs(18),
            settle_delay: Duration::from_millis(600),
            country_qualifier: "Qatar".to_string(),
            fallback_result_count: 5,

            webdriver_url: None,
            browser_command_timeout: Duration::from_secs(10),
            serpapi_key: None,
            serpapi_endpoint: DEFAULT_SERPAPI_ENDPOINT.to_string(),

            scoring: ScoringConfig::default(),

            loaded_config_path: None,
        }
    }
}

/// Mirrors the TOML file layout. Every field is optional; unset fields keep
/// the value already present in `Config`.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ConfigFile {
    pub network: NetworkSection,
    pub collection: CollectionSection,
    pub resolution: ResolutionSection,
    pub browser: BrowserSection,
    pub serpapi: SerpApiSection,
    pub scoring: ScoringSection,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct NetworkSection {
    pub user_agent: Option<String>,
    pub request_timeout: Option<u64>,
    pub discovery_timeout: Option<u64>,
    pub fallback_timeout: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CollectionSection {
    pub target_count: Option<usize>,
    pub max_concurrency: Option<usize>,
    pub page_pacing_ms: Option<u64>,
    pub search_queries: Option<Vec<String>>,
    pub geo_anchor: Option<String>,
    pub language: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ResolutionSection {
    pub contact_paths: Option<Vec<String>>,
    pub dynamic_paths: Option<Vec<String>>,
    pub navigation_timeout: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub country_qualifier: Option<String>,
    pub fallback_result_count: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct BrowserSection {
    pub webdriver_url: Option<String>,
    pub command_timeout: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SerpApiSection {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ScoringSection {
    pub same_domain_bonus: Option<i32>,
    pub cross_domain_penalty: Option<i32>,
    pub mailto_weight: Option<i32>,
    pub schema_org_weight: Option<i32>,
    pub cloudflare_weight: Option<i32>,
    pub text_obfuscated_weight: Option<i32>,
    pub dynamic_weight: Option<i32>,
    pub raw_regex_weight: Option<i32>,
    pub role_account_bonus: Option<i32>,
    pub country_tld_bonus: Option<i32>,
    pub generic_tld_bonus: Option<i32>,
    pub numeric_noise_penalty: Option<i32>,
    pub country_tld: Option<String>,
    pub generic_tlds: Option<Vec<String>>,
    pub junk_keywords: Option<Vec<String>>,
    pub junk_domains: Option<Vec<String>>,
    pub noreply_prefixes: Option<Vec<String>>,
    pub role_prefixes: Option<Vec<String>>,
    pub binary_extensions: Option<Vec<String>>,
}
