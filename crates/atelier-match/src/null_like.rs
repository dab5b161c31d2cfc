//! Non-answer detection.
//!
//! Vision models pad their output with placeholders ("N/A", "unknown") and
//! vague filler ("standard", "various") instead of admitting they saw
//! nothing. Both must be treated as absent values, never as literal
//! attribute values, and filler must never sneak into the table through the
//! raw-value fallback.

use crate::normalize::normalize_key;

/// Hard non-answers. These are absent regardless of attribute.
const NULL_LIKE: &[&str] = &[
    "", "null", "nil", "na", "n/a", "none", "unknown", "unclear",
    "notspecified", "notvisible", "notapplicable", "notavailable",
    "cannotdetermine", "unspecified",
];

/// Generic filler the model uses as a shrug. These are non-answers *unless*
/// the attribute's own rules claim them (e.g. "plain" is a real pattern
/// value but a meaningless neckline), so the processor consults this set
/// only after the exact and safeguard stages have had their chance.
const FILLER: &[&str] = &[
    "plain", "basic", "standard", "regular", "normal", "various",
    "generic", "default", "simple", "usual",
];

/// Whether the raw value is a hard non-answer.
pub fn is_null_like(raw: &str) -> bool {
    NULL_LIKE.contains(&normalize_key(raw).as_str())
}

/// Whether the raw value is generic filler.
pub fn is_filler(raw: &str) -> bool {
    FILLER.contains(&normalize_key(raw).as_str())
}

/// Display gate for the raw-value fallback: suppress non-answers, filler,
/// and bare numeric noise (one or two digits with no unit or context) from
/// being shown as if they were meaningful.
pub fn is_valid_raw_value(raw: &str) -> bool {
    let key = normalize_key(raw);
    if key.is_empty() || NULL_LIKE.contains(&key.as_str()) || FILLER.contains(&key.as_str()) {
        return false;
    }
    if key.len() <= 2 && key.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    true
}
