//! Semantic token matching (stage 4).
//!
//! Scores each vocabulary candidate by the fraction of the raw value's
//! significant tokens that appear in the candidate's short+full form,
//! verbatim or through the synonym dictionary. A candidate is accepted only
//! when that fraction clears [`defaults::SEMANTIC_MATCH_THRESHOLD`].

use atelier_core::defaults;
use atelier_core::models::AttributeDefinition;

use crate::normalize::{contains_negation, significant_tokens, singularize, words};
use crate::synonyms::token_affinity;

/// A scored candidate from the semantic stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    pub code: String,
    /// Token-match fraction, 0.0-1.0.
    pub score: f64,
}

/// Match the raw value against the vocabulary by token overlap.
///
/// Negation tokens anywhere in the value disqualify every candidate:
/// "no pockets" must never resolve to a pocket code.
pub fn semantic_match(raw: &str, def: &AttributeDefinition) -> Option<SemanticHit> {
    let values = def.allowed_values.as_ref()?;
    if contains_negation(raw) {
        return None;
    }

    let tokens = significant_tokens(raw);
    if tokens.is_empty() {
        return None;
    }

    let mut best: Option<SemanticHit> = None;
    for v in values {
        // Candidate tokens keep short fragments: short forms are often
        // 2-letter codes that the significance filter would drop.
        let mut candidate_tokens = words(&v.short_form);
        if let Some(full) = &v.full_form {
            candidate_tokens.extend(words(full));
        }
        let candidate_singular: Vec<String> =
            candidate_tokens.iter().map(|t| singularize(t)).collect();

        let mut matched = 0.0;
        for token in &tokens {
            let token_singular = singularize(token);
            let affinity = candidate_tokens
                .iter()
                .chain(candidate_singular.iter())
                .filter_map(|ct| {
                    token_affinity(token, ct)
                        .or_else(|| token_affinity(&token_singular, ct))
                })
                .fold(None::<f64>, |acc, c| {
                    Some(acc.map_or(c, |a| a.max(c)))
                });
            if let Some(conf) = affinity {
                matched += conf;
            }
        }

        let score = matched / tokens.len() as f64;
        let better = match &best {
            None => true,
            // Strictly-greater keeps the first-seen candidate on ties.
            Some(b) => score > b.score,
        };
        if better {
            best = Some(SemanticHit {
                code: v.short_form.clone(),
                score,
            });
        }
    }

    best.filter(|b| b.score >= defaults::SEMANTIC_MATCH_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::models::{AllowedValue, AttributeDefinition};

    fn neck_def() -> AttributeDefinition {
        AttributeDefinition::select(
            "neck_type",
            "Neck Type",
            vec![
                AllowedValue::new("RN", "Round Neck"),
                AllowedValue::new("VN", "V Neck"),
                AllowedValue::new("BN", "Boat Neck"),
            ],
        )
    }

    #[test]
    fn test_verbatim_tokens_match() {
        let hit = semantic_match("round neck", &neck_def()).unwrap();
        assert_eq!(hit.code, "RN");
        assert!((hit.score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_synonym_tokens_match() {
        // "crew" -> "round" through the dictionary; "neck" verbatim.
        let hit = semantic_match("crew neck", &neck_def()).unwrap();
        assert_eq!(hit.code, "RN");
        assert!(hit.score >= 0.90 && hit.score < 1.0);
    }

    #[test]
    fn test_plural_tokens_fold() {
        let def = AttributeDefinition::select(
            "pattern",
            "Pattern",
            vec![AllowedValue::new("STR", "Stripe")],
        );
        let hit = semantic_match("stripes", &def).unwrap();
        assert_eq!(hit.code, "STR");
    }

    #[test]
    fn test_negation_disqualifies_all_candidates() {
        let def = AttributeDefinition::select(
            "pocket_type",
            "Pocket Type",
            vec![
                AllowedValue::new("PAT", "Patch Pocket"),
                AllowedValue::new("KNG", "Kangaroo Pocket"),
            ],
        );
        assert!(semantic_match("no pockets", &def).is_none());
        assert!(semantic_match("without patch pocket", &def).is_none());
        assert!(semantic_match("none", &def).is_none());
    }

    #[test]
    fn test_partial_overlap_below_bar_rejected() {
        // Only "neck" of "wide neck opening" matches: 1/3 < 0.90.
        assert!(semantic_match("wide neck opening", &neck_def()).is_none());
    }

    #[test]
    fn test_tie_broken_first_seen() {
        let def = AttributeDefinition::select(
            "x",
            "X",
            vec![
                AllowedValue::new("A1", "Classic Fit"),
                AllowedValue::new("A2", "Classic Fit"),
            ],
        );
        let hit = semantic_match("classic fit", &def).unwrap();
        assert_eq!(hit.code, "A1");
    }

    #[test]
    fn test_no_vocabulary() {
        let def = AttributeDefinition::text("remarks", "Remarks");
        assert!(semantic_match("round neck", &def).is_none());
    }

    #[test]
    fn test_empty_tokens() {
        assert!(semantic_match("of", &neck_def()).is_none());
        assert!(semantic_match("", &neck_def()).is_none());
    }
}
