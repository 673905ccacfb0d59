//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn set_list(target: &mut Vec<String>, value: &Option<Vec<String>>) {
    if let Some(list) = value {
        if !list.is_empty() {
            *target = list.clone();
        }
    }
}

/// Applies settings from a parsed `ConfigFile` onto a mutable `Config`.
/// Used both for file contents and for builder overrides.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Network
    let network = &file_config.network;
    set(&mut config.user_agent, &network.user_agent);
    if let Some(secs) = network.request_timeout {
        config.request_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = network.discovery_timeout {
        config.discovery_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = network.fallback_timeout {
        config.fallback_timeout = Duration::from_secs(secs);
    }

    // Collection
    let collection = &file_config.collection;
    set(&mut config.target_count, &collection.target_count);
    set(&mut config.max_concurrency, &collection.max_concurrency);
    if let Some(ms) = collection.page_pacing_ms {
        config.page_pacing = Duration::from_millis(ms);
    }
    if let Some(ref queries) = collection.search_queries {
        config.search_queries = queries.clone();
    }
    set(&mut config.geo_anchor, &collection.geo_anchor);
    set(&mut config.language, &collection.language);

    // Resolution
    let resolution = &file_config.resolution;
    set_list(&mut config.contact_paths, &resolution.contact_paths);
    set_list(&mut config.dynamic_paths, &resolution.dynamic_paths);
    if let Some(secs) = resolution.navigation_timeout {
        config.navigation_timeout = Duration::from_secs(secs);
    }
    if let Some(ms) = resolution.settle_delay_ms {
        config.settle_delay = Duration::from_millis(ms);
    }
    set(&mut config.country_qualifier, &resolution.country_qualifier);
    set(
        &mut config.fallback_result_count,
        &resolution.fallback_result_count,
    );

    // Collaborators
    if let Some(ref url) = file_config.browser.webdriver_url {
        config.webdriver_url = Some(url.trim().to_string()).filter(|u| !u.is_empty());
    }
    if let Some(secs) = file_config.browser.command_timeout {
        config.browser_command_timeout = Duration::from_secs(secs);
    }
    if let Some(ref key) = file_config.serpapi.api_key {
        config.serpapi_key = Some(key.trim().to_string()).filter(|k| !k.is_empty());
    }
    set(&mut config.serpapi_endpoint, &file_config.serpapi.endpoint);

    // Scoring
    let s = &file_config.scoring;
    let scoring = &mut config.scoring;
    set(&mut scoring.same_domain_bonus, &s.same_domain_bonus);
    set(&mut scoring.cross_domain_penalty, &s.cross_domain_penalty);
    set(&mut scoring.mailto_weight, &s.mailto_weight);
    set(&mut scoring.schema_org_weight, &s.schema_org_weight);
    set(&mut scoring.cloudflare_weight, &s.cloudflare_weight);
    set(&mut scoring.text_obfuscated_weight, &s.text_obfuscated_weight);
    set(&mut scoring.dynamic_weight, &s.dynamic_weight);
    set(&mut scoring.raw_regex_weight, &s.raw_regex_weight);
    set(&mut scoring.role_account_bonus, &s.role_account_bonus);
    set(&mut scoring.country_tld_bonus, &s.country_tld_bonus);
    set(&mut scoring.generic_tld_bonus, &s.generic_tld_bonus);
    set(&mut scoring.numeric_noise_penalty, &s.numeric_noise_penalty);
    set(&mut scoring.country_tld, &s.country_tld);
    set_list(&mut scoring.generic_tlds, &s.generic_tlds);
    set_list(&mut scoring.junk_keywords, &s.junk_keywords);
    set_list(&mut scoring.junk_domains, &s.junk_domains);
    set_list(&mut scoring.noreply_prefixes, &s.noreply_prefixes);
    set_list(&mut scoring.role_prefixes, &s.role_prefixes);
    set_list(&mut scoring.binary_extensions, &s.binary_extensions);
}
