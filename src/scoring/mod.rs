//! Deterministic trust scoring for email candidates.
//!
//! Hard-reject rules run first, in order; the first one that fires returns
//! the reject score. Otherwise the score is the unclamped sum of the domain
//! match, strategy weight, role-account, TLD and numeric-noise terms.

mod selector;

pub use selector::{is_selectable, select_best, SELECTION_FLOOR};

use crate::core::config::ScoringConfig;
use crate::core::models::StrategyTag;
use crate::utils::domain::{email_domain, email_local_part, host_for_matching};

#[derive(Debug, Clone)]
pub struct Scorer {
    weights: ScoringConfig,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl Scorer {
    pub fn new(weights: ScoringConfig) -> Self {
        Self { weights }
    }

    /// Scores `email` as found by `strategy` on `website`.
    pub fn score(&self, email: &str, strategy: StrategyTag, website: &str) -> i32 {
        self.score_against_host(email, strategy, &host_for_matching(website))
    }

    /// Same as [`Scorer::score`] with the website host already derived.
    pub(crate) fn score_against_host(&self, email: &str, strategy: StrategyTag, host: &str) -> i32 {
        let w = &self.weights;
        let email = email.to_lowercase();
        let local = email_local_part(&email);
        let domain = email_domain(&email);

        if w.junk_keywords.iter().any(|k| email.contains(k.as_str())) {
            return w.reject_score;
        }
        if w.junk_domains.iter().any(|d| d == domain) {
            return w.reject_score;
        }
        if w.noreply_prefixes.iter().any(|p| local.starts_with(p.as_str())) {
            return w.reject_score;
        }
        if w.binary_extensions.iter().any(|x| email.ends_with(x.as_str())) {
            return w.reject_score;
        }

        let mut score = if domain.ends_with(host) {
            w.same_domain_bonus
        } else {
            w.cross_domain_penalty
        };

        score += self.strategy_weight(strategy);

        if w.role_prefixes.iter().any(|p| local.starts_with(p.as_str())) {
            score += w.role_account_bonus;
        }

        if email.ends_with(&format!(".{}", w.country_tld)) {
            score += w.country_tld_bonus;
        } else if w
            .generic_tlds
            .iter()
            .any(|tld| email.ends_with(&format!(".{}", tld)))
        {
            score += w.generic_tld_bonus;
        }

        if longest_digit_run(local) >= w.numeric_noise_run {
            score += w.numeric_noise_penalty;
        }

        score
    }

    fn strategy_weight(&self, strategy: StrategyTag) -> i32 {
        let w = &self.weights;
        match strategy {
            StrategyTag::Mailto => w.mailto_weight,
            StrategyTag::SchemaOrg => w.schema_org_weight,
            StrategyTag::CloudflareObfuscated => w.cloudflare_weight,
            StrategyTag::TextObfuscated => w.text_obfuscated_weight,
            StrategyTag::Dynamic => w.dynamic_weight,
            StrategyTag::RawRegex => w.raw_regex_weight,
        }
    }
}

fn longest_digit_run(s: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in s.chars() {
        if c.is_ascii_digit() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TAGS: [StrategyTag; 6] = [
        StrategyTag::Mailto,
        StrategyTag::CloudflareObfuscated,
        StrategyTag::SchemaOrg,
        StrategyTag::TextObfuscated,
        StrategyTag::RawRegex,
        StrategyTag::Dynamic,
    ];

    #[test]
    fn same_domain_role_mailto_country_tld() {
        let scorer = Scorer::default();
        assert_eq!(
            scorer.score("info@dohasmile.qa", StrategyTag::Mailto, "dohasmile.qa"),
            50 + 30 + 20 + 15
        );
    }

    #[test]
    fn cross_domain_penalty_applies() {
        let scorer = Scorer::default();
        // -40 + 5 (regex) + 5 (.com)
        assert_eq!(
            scorer.score("dr.ali@gmail.com", StrategyTag::RawRegex, "https://www.clinic.qa"),
            -30
        );
    }

    #[test]
    fn subdomain_counts_as_same_domain() {
        let scorer = Scorer::default();
        assert_eq!(
            scorer.score("frontdesk@mail.clinic.qa", StrategyTag::SchemaOrg, "www.clinic.qa"),
            50 + 28 + 15
        );
    }

    #[test]
    fn hard_rejects_ignore_tag_and_website() {
        let scorer = Scorer::default();
        let junk = [
            "tracker@sentry.io",
            "hello@fonts.example.org",
            "user@wixpress.com",
            "noreply@clinic.qa",
            "no-reply@clinic.qa",
            "mailer-daemon@clinic.qa",
            "logo@2x.png",
            "bundle@chunk.js",
        ];
        for email in junk {
            for tag in ALL_TAGS {
                for site in ["clinic.qa", "", "sentry.io"] {
                    assert_eq!(scorer.score(email, tag, site), -100, "{} / {:?} / {}", email, tag, site);
                }
            }
        }
    }

    #[test]
    fn numeric_noise_penalty() {
        let scorer = Scorer::default();
        let clean = scorer.score("ward@clinic.qa", StrategyTag::RawRegex, "clinic.qa");
        let noisy = scorer.score("ward12345@clinic.qa", StrategyTag::RawRegex, "clinic.qa");
        let short = scorer.score("ward1234@clinic.qa", StrategyTag::RawRegex, "clinic.qa");
        assert_eq!(clean - noisy, 15);
        assert_eq!(clean, short);
    }

    #[test]
    fn empty_website_matches_any_domain() {
        let scorer = Scorer::default();
        assert_eq!(
            scorer.score("contact@clinic.qa", StrategyTag::RawRegex, ""),
            50 + 5 + 20 + 15
        );
    }

    #[test]
    fn score_is_deterministic_and_case_insensitive() {
        let scorer = Scorer::default();
        let a = scorer.score("Reception@Clinic.QA", StrategyTag::Dynamic, "clinic.qa");
        let b = scorer.score("Reception@Clinic.QA", StrategyTag::Dynamic, "clinic.qa");
        assert_eq!(a, b);
        assert_eq!(a, scorer.score("reception@clinic.qa", StrategyTag::Dynamic, "CLINIC.qa"));
        assert_eq!(a, 50 + 10 + 20 + 15);
    }

    #[test]
    fn custom_weights_are_honoured() {
        let weights = ScoringConfig {
            country_tld: "ae".to_string(),
            mailto_weight: 1,
            ..ScoringConfig::default()
        };
        let scorer = Scorer::new(weights);
        assert_eq!(
            scorer.score("sales@store.ae", StrategyTag::Mailto, "store.ae"),
            50 + 1 + 15
        );
    }
}
