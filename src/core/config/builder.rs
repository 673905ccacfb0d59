//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, Result};
use crate::AppError;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["./contact-sleuth.toml", "./config.toml"];

/// Builder pattern for creating `Config` instances fluently.
///
/// Layers defaults, then a TOML file, then the explicit overrides set on the
/// builder, and validates the result.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    skip_default_locations: bool,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Do not probe `./contact-sleuth.toml` and `./config.toml`.
    pub fn ignore_default_locations(mut self) -> Self {
        self.skip_default_locations = true;
        self
    }

    pub fn target_count(mut self, value: usize) -> Self {
        self.overrides.collection.target_count = Some(value);
        self
    }
    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.overrides.collection.max_concurrency = Some(value);
        self
    }
    pub fn page_pacing(mut self, duration: Duration) -> Self {
        self.overrides.collection.page_pacing_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn search_queries(mut self, queries: Vec<String>) -> Self {
        self.overrides.collection.search_queries = Some(queries);
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.user_agent = Some(value.into());
        self
    }
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs());
        self
    }
    pub fn navigation_timeout(mut self, duration: Duration) -> Self {
        self.overrides.resolution.navigation_timeout = Some(duration.as_secs());
        self
    }
    pub fn settle_delay(mut self, duration: Duration) -> Self {
        self.overrides.resolution.settle_delay_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn country_qualifier(mut self, value: impl Into<String>) -> Self {
        self.overrides.resolution.country_qualifier = Some(value.into());
        self
    }
    pub fn country_tld(mut self, value: impl Into<String>) -> Self {
        self.overrides.scoring.country_tld = Some(value.into());
        self
    }
    pub fn webdriver_url(mut self, url: Option<impl Into<String>>) -> Self {
        self.overrides.browser.webdriver_url = url.map(|s| s.into());
        self
    }
    pub fn serpapi_key(mut self, key: Option<impl Into<String>>) -> Self {
        self.overrides.serpapi.api_key = key.map(|s| s.into());
        self
    }
    pub fn serpapi_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.overrides.serpapi.endpoint = Some(endpoint.into());
        self
    }

    /// Builds the final `Config`, applying defaults, file settings, overrides and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else if !self.skip_default_locations {
            for path_str in DEFAULT_CONFIG_LOCATIONS {
                if !Path::new(path_str).exists() {
                    continue;
                }
                match load_config_file(path_str) {
                    Ok(file_config) => {
                        apply_file_config(&mut self.config, &file_config);
                        loaded_path = Some(path_str.to_string());
                        tracing::info!(
                            "Loaded base configuration from default location: {}",
                            path_str
                        );
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load or parse default config '{}': {}",
                            path_str,
                            e
                        );
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::debug!("No configuration file found. Using defaults and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}
