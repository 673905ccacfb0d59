//! Picks the single most trustworthy candidate.

use crate::core::models::Candidate;

/// Candidates at or below this score are discarded before ranking. Sits below
/// the cross-domain penalty so that a domain mismatch alone does not disqualify.
pub const SELECTION_FLOOR: i32 = -50;

/// Returns the best email, or `None` when no candidate clears a positive score.
///
/// Ties keep the earliest candidate.
pub fn select_best(candidates: &[Candidate]) -> Option<&str> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates.iter().filter(|c| c.score > SELECTION_FLOOR) {
        match best {
            Some(current) if current.score >= candidate.score => {}
            _ => best = Some(candidate),
        }
    }
    best.filter(|c| c.score > 0).map(|c| c.email.as_str())
}

pub fn is_selectable(candidates: &[Candidate]) -> bool {
    select_best(candidates).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::StrategyTag;

    fn cand(email: &str, score: i32) -> Candidate {
        Candidate {
            email: email.to_string(),
            strategy: StrategyTag::RawRegex,
            score,
        }
    }

    #[test]
    fn picks_highest_positive() {
        let cands = vec![cand("a@x.qa", 10), cand("b@x.qa", 115), cand("c@x.qa", 40)];
        assert_eq!(select_best(&cands), Some("b@x.qa"));
    }

    #[test]
    fn ties_keep_first() {
        let cands = vec![cand("first@x.qa", 60), cand("second@x.qa", 60)];
        assert_eq!(select_best(&cands), Some("first@x.qa"));
    }

    #[test]
    fn never_returns_non_positive() {
        assert_eq!(select_best(&[]), None);
        assert_eq!(select_best(&[cand("a@x.qa", 0)]), None);
        assert_eq!(select_best(&[cand("a@x.qa", -35)]), None);
        assert_eq!(select_best(&[cand("a@x.qa", -100), cand("b@x.qa", -50)]), None);
    }

    #[test]
    fn rejected_candidates_do_not_mask_survivors() {
        let cands = vec![cand("junk@sentry.io", -100), cand("ok@x.qa", 5)];
        assert_eq!(select_best(&cands), Some("ok@x.qa"));
        assert!(is_selectable(&cands));
    }
}
