//! Utility functions for handling websites, origins and email domains.

use crate::core::error::{AppError, Result};
use url::Url;

/// Placeholder the discovery provider uses for a missing website.
pub(crate) const MISSING_WEBSITE: &str = "N/A";

/// Returns `true` when the website field carries nothing worth fetching.
pub(crate) fn is_missing_website(website: &str) -> bool {
    let trimmed = website.trim();
    trimmed.is_empty() || trimmed == MISSING_WEBSITE
}

/// Parses a website string into an absolute `Url`.
///
/// Inputs without an `http`/`https` prefix get the insecure `http://` scheme,
/// since redirects usually upgrade it anyway.
pub(crate) fn normalize_website(website: &str) -> Result<Url> {
    let trimmed_input = website.trim();
    if is_missing_website(trimmed_input) {
        return Err(AppError::InsufficientInput(
            "Website input is empty".to_string(),
        ));
    }

    let with_scheme = if trimmed_input.to_lowercase().starts_with("http") {
        trimmed_input.to_string()
    } else {
        format!("http://{}", trimmed_input)
    };

    let url = Url::parse(&with_scheme).map_err(|e| {
        tracing::debug!("Failed to parse website '{}': {}", trimmed_input, e);
        AppError::UrlParse(e)
    })?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(AppError::UrlParse(url::ParseError::EmptyHost)),
    }
}

/// The scheme + host (+ port) root of a URL, e.g. `https://clinic.qa/`.
pub(crate) fn site_origin(url: &Url) -> Result<Url> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(AppError::UrlParse(url::ParseError::EmptyHost));
    }
    Ok(Url::parse(&origin.ascii_serialization())?)
}

/// Lower-cased host of the website with a leading `www.` removed.
///
/// Returns an empty string when no host can be derived. An empty host is a
/// suffix of every domain, so candidates are then treated as same-domain.
pub(crate) fn host_for_matching(website: &str) -> String {
    normalize_website(website)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_default()
}

/// Local part of an address (everything before the first `@`).
pub(crate) fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or("")
}

/// Domain part of an address (everything after the last `@`).
pub(crate) fn email_domain(email: &str) -> &str {
    email.rsplit('@').next().unwrap_or("")
}
