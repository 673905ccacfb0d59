//! The individual pattern matchers.
//!
//! Each matcher scans the whole input on its own. None of them filter on `@`;
//! that happens once, in the extractor.

use super::{ExtractionError, Matcher, RawHit};
use crate::core::models::StrategyTag;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

lazy_static! {
    static ref MAILTO_REGEX: Regex =
        Regex::new(r"(?i)mailto:([a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,12})").unwrap();

    static ref CLOUDFLARE_REGEX: Regex =
        Regex::new(r#"(?i)data-cfemail="([0-9a-f]+)""#).unwrap();

    static ref SCHEMA_EMAIL_REGEX: Regex =
        Regex::new(r#"(?i)"email"\s*:\s*"([^"]+)""#).unwrap();

    // user [at] domain (dot) tld, brackets optional
    static ref TEXT_OBFUSCATED_REGEX: Regex = Regex::new(
        r"([a-zA-Z0-9._%+\-]{2,64})\s*[\[(]?\s*(?i:at)\s*[\])]?\s*([a-zA-Z0-9.\-]{2,255})\s*[\[(]?\s*(?i:dot)\s*[\])]?\s*([a-zA-Z]{2,12})"
    ).unwrap();

    // Boundaries are checked in code: the regex crate has no look-around.
    static ref RAW_EMAIL_REGEX: Regex = Regex::new(
        r"(?i)[a-z0-9._%+\-]{2,64}@[a-z0-9.\-]{2,255}\.[a-z]{2,12}"
    ).unwrap();
}

fn hit(email: impl Into<String>, strategy: StrategyTag) -> RawHit {
    RawHit {
        email: email.into(),
        strategy,
    }
}

/// `mailto:` targets anywhere in the raw text.
pub struct MailtoTextMatcher;

impl Matcher for MailtoTextMatcher {
    fn name(&self) -> &'static str {
        "mailto_text"
    }

    fn find(&self, content: &str, _default: StrategyTag) -> Result<Vec<RawHit>, ExtractionError> {
        Ok(MAILTO_REGEX
            .captures_iter(content)
            .filter_map(|c| c.get(1))
            .map(|m| hit(m.as_str(), StrategyTag::Mailto))
            .collect())
    }
}

/// Decodes a Cloudflare `data-cfemail` payload.
///
/// The first byte is the XOR key for every following byte. Odd-length or
/// non-hex input decodes to an empty string.
pub fn decode_cf(encoded: &str) -> String {
    let bytes = match hex::decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return String::new(),
    };
    match bytes.split_first() {
        Some((key, rest)) => rest.iter().map(|b| (b ^ key) as char).collect(),
        None => String::new(),
    }
}

/// Cloudflare email-protection markers.
pub struct CloudflareMatcher;

impl Matcher for CloudflareMatcher {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    fn find(&self, content: &str, _default: StrategyTag) -> Result<Vec<RawHit>, ExtractionError> {
        let mut hits = Vec::new();
        for caps in CLOUDFLARE_REGEX.captures_iter(content) {
            let Some(encoded) = caps.get(1) else { continue };
            let decoded = decode_cf(encoded.as_str());
            if decoded.is_empty() {
                tracing::trace!(target: "extraction", "Dropping undecodable cfemail payload '{}'", encoded.as_str());
                continue;
            }
            hits.push(hit(decoded, StrategyTag::CloudflareObfuscated));
        }
        Ok(hits)
    }
}

/// Inline JSON / schema.org `"email": "..."` fields.
pub struct SchemaOrgMatcher;

impl Matcher for SchemaOrgMatcher {
    fn name(&self) -> &'static str {
        "schema_org"
    }

    fn find(&self, content: &str, _default: StrategyTag) -> Result<Vec<RawHit>, ExtractionError> {
        Ok(SCHEMA_EMAIL_REGEX
            .captures_iter(content)
            .filter_map(|c| c.get(1))
            .map(|m| hit(m.as_str().trim(), StrategyTag::SchemaOrg))
            .collect())
    }
}

/// `user AT domain DOT tld`, reassembled into `user@domain.tld`.
pub struct TextObfuscatedMatcher;

impl Matcher for TextObfuscatedMatcher {
    fn name(&self) -> &'static str {
        "text_obfuscated"
    }

    fn find(&self, content: &str, _default: StrategyTag) -> Result<Vec<RawHit>, ExtractionError> {
        let mut hits = Vec::new();
        for caps in TEXT_OBFUSCATED_REGEX.captures_iter(content) {
            match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(user), Some(domain), Some(tld)) => hits.push(hit(
                    format!("{}@{}.{}", user.as_str(), domain.as_str(), tld.as_str()),
                    StrategyTag::TextObfuscated,
                )),
                _ => {
                    return Err(ExtractionError::Malformed(
                        "obfuscated match missing a component".to_string(),
                    ))
                }
            }
        }
        Ok(hits)
    }
}

/// General email-shaped strings not embedded in a path or a longer word.
/// Tagged with the caller's default strategy.
pub struct RawEmailMatcher;

fn is_blocking_neighbour(c: char) -> bool {
    c == '/' || c == '_' || c.is_alphanumeric()
}

impl Matcher for RawEmailMatcher {
    fn name(&self) -> &'static str {
        "raw_regex"
    }

    fn find(&self, content: &str, default: StrategyTag) -> Result<Vec<RawHit>, ExtractionError> {
        let mut hits = Vec::new();
        let mut at = 0;
        while at <= content.len() {
            let Some(m) = RAW_EMAIL_REGEX.find_at(content, at) else {
                break;
            };
            let before_ok = !content[..m.start()]
                .chars()
                .next_back()
                .is_some_and(is_blocking_neighbour);
            let after_ok = !content[m.end()..]
                .chars()
                .next()
                .is_some_and(is_blocking_neighbour);

            if before_ok && after_ok {
                hits.push(hit(m.as_str(), default));
                at = m.end();
            } else {
                let step = content[m.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                at = m.start() + step;
            }
        }
        Ok(hits)
    }
}

/// `<a href="mailto:...">` links, read through a real HTML parser.
pub struct AnchorMailtoMatcher;

impl Matcher for AnchorMailtoMatcher {
    fn name(&self) -> &'static str {
        "anchor_mailto"
    }

    fn find(&self, content: &str, _default: StrategyTag) -> Result<Vec<RawHit>, ExtractionError> {
        let selector = Selector::parse("a[href]")
            .map_err(|e| ExtractionError::Selector(format!("{:?}", e)))?;
        let document = Html::parse_document(content);

        Ok(document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| {
                href.get(..7)
                    .is_some_and(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
            })
            .filter_map(|href| href.get(7..))
            .map(|target| target.split('?').next().unwrap_or("").trim())
            .map(|email| hit(email, StrategyTag::Mailto))
            .collect())
    }
}
