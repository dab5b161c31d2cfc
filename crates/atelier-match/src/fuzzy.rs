//! Weighted fuzzy string similarity (stage 5).
//!
//! Normalized edit similarity between the raw value and each allowed
//! value's full form (priority) and short form (fallback), boosted by
//! auxiliary heuristics: abbreviation-of-initials detection, substring
//! containment, plural folding, word-order independence, and a small table
//! of fixed fashion abbreviations. Best score must clear
//! [`defaults::FUZZY_MATCH_THRESHOLD`].

use atelier_core::defaults;
use atelier_core::models::AttributeDefinition;
use similar::TextDiff;

use crate::normalize::{contains_negation, initials, normalize_key, singularize, words};

/// Fixed fashion abbreviations expanded before comparison.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("tee", "t-shirt"),
    ("hoody", "hoodie"),
    ("cami", "camisole"),
    ("turtleneck", "turtle neck"),
    ("slvs", "sleeves"),
    ("emb", "embroidery"),
    ("gsm", "grams per square meter"),
];

/// A scored candidate from the fuzzy stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyHit {
    pub code: String,
    /// Best heuristic score, 0.0-1.0.
    pub score: f64,
}

/// Normalized character-level edit similarity on collapsed keys.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_key(a);
    let b = normalize_key(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    TextDiff::from_chars(a.as_str(), b.as_str()).ratio() as f64
}

/// Expand known abbreviations in the raw value.
fn expand_abbreviations(raw: &str) -> String {
    let mut out = raw.to_lowercase();
    for (abbr, full) in ABBREVIATIONS {
        // Whole-word replacement only.
        let mut replaced = String::with_capacity(out.len());
        for (i, w) in out.split_whitespace().enumerate() {
            if i > 0 {
                replaced.push(' ');
            }
            replaced.push_str(if w == *abbr { full } else { w });
        }
        out = replaced;
    }
    out
}

/// Sort words alphabetically so "neck round" compares equal to "round neck".
fn order_independent(s: &str) -> String {
    let mut ws = words(s);
    ws.sort();
    ws.join("")
}

/// Fold each word to singular before collapsing.
fn singular_key(s: &str) -> String {
    words(s)
        .iter()
        .map(|w| singularize(w))
        .collect::<Vec<_>>()
        .join("")
}

/// Best similarity between a raw value and one candidate string, across
/// all heuristics.
fn candidate_score(raw: &str, candidate: &str) -> f64 {
    let mut score = string_similarity(raw, candidate);

    // Abbreviation of initials: "rn" vs "Round Neck".
    if normalize_key(raw) == initials(candidate) {
        score = score.max(0.92);
    }

    // Expanded abbreviations: "tee" scored as "t-shirt".
    let expanded = expand_abbreviations(raw);
    if expanded != raw.to_lowercase() {
        score = score.max(string_similarity(&expanded, candidate));
    }

    // Word-order independence.
    let (a, b) = (order_independent(raw), order_independent(candidate));
    if !a.is_empty() && a == b {
        score = score.max(0.95);
    }

    // Plural/singular equivalence.
    if singular_key(raw) == singular_key(candidate) && !singular_key(raw).is_empty() {
        score = score.max(0.97);
    }

    // Substring containment. Prefix containment ("polo" / "polo collar")
    // counts at any length ratio; interior containment needs the strings
    // to be close in length so "neck" can't trivially claim "round neck".
    let (rk, ck) = (normalize_key(raw), normalize_key(candidate));
    if rk.len() >= 4 && ck.len() >= 4 {
        let ratio = rk.len().min(ck.len()) as f64 / rk.len().max(ck.len()) as f64;
        let prefix = rk.starts_with(&ck) || ck.starts_with(&rk);
        let interior = rk.contains(&ck) || ck.contains(&rk);
        if prefix || (interior && ratio >= 0.5) {
            score = score.max(0.70 + 0.25 * ratio);
        }
    }

    score
}

/// Match the raw value against the vocabulary by weighted fuzzy similarity.
///
/// Full forms take priority; short forms are the fallback and are slightly
/// discounted so a genuine full-form hit always wins the tie.
pub fn fuzzy_match(raw: &str, def: &AttributeDefinition) -> Option<FuzzyHit> {
    let values = def.allowed_values.as_ref()?;
    if normalize_key(raw).is_empty() {
        return None;
    }
    // Same contract as the semantic stage: "no v neck" must not score as
    // a V Neck just because the candidate is a substring of it.
    if contains_negation(raw) {
        return None;
    }

    let mut best: Option<FuzzyHit> = None;
    for v in values {
        let mut score = 0.0f64;
        if let Some(full) = &v.full_form {
            score = candidate_score(raw, full);
        }
        score = score.max(candidate_score(raw, &v.short_form) * 0.98);

        let better = match &best {
            None => true,
            Some(b) => score > b.score,
        };
        if better {
            best = Some(FuzzyHit {
                code: v.short_form.clone(),
                score,
            });
        }
    }

    best.filter(|b| b.score >= defaults::FUZZY_MATCH_THRESHOLD)
}
