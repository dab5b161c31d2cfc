//! Text normalization primitives shared by every matching stage.

/// Words that carry no matching signal and are dropped during tokenization.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "in", "on", "at", "for", "with",
    "is", "are", "was", "has", "have", "its", "this", "that", "style",
    "type", "kind",
];

/// Tokens that signal absence. A value containing any of these must never
/// resolve to a vocabulary code via token matching.
pub const NEGATION_TOKENS: &[&str] = &["no", "without", "not", "none"];

/// Collapse a value to a comparison key: lowercase, punctuation stripped,
/// all whitespace removed. "Round-Neck" and "round neck" compare equal.
pub fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Split a value into lowercase words on any non-alphanumeric boundary.
pub fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Significant tokens: words minus stop words and 1-2 letter fragments.
pub fn significant_tokens(s: &str) -> Vec<String> {
    words(s)
        .into_iter()
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Whether any token of the value is a negation word.
pub fn contains_negation(s: &str) -> bool {
    words(s).iter().any(|w| NEGATION_TOKENS.contains(&w.as_str()))
}

/// Crude plural folding, enough for vocabulary terms ("stripes" ==
/// "stripe", "dresses" == "dress"). Not a stemmer.
pub fn singularize(token: &str) -> String {
    if token.len() > 4 && token.ends_with("sses") {
        return token[..token.len() - 2].to_string();
    }
    if token.len() > 3 && token.ends_with("ies") {
        return format!("{}y", &token[..token.len() - 3]);
    }
    if token.len() > 3 && token.ends_with("es") && !token.ends_with("ses") {
        return token[..token.len() - 1].to_string();
    }
    if token.len() > 2 && token.ends_with('s') && !token.ends_with("ss") {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

/// First letter of each word, lowercased. "Round Neck" -> "rn".
pub fn initials(s: &str) -> String {
    words(s)
        .iter()
        .filter_map(|w| w.chars().next())
        .collect()
}
