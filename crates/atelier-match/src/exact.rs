//! Exact vocabulary matching (stage 2).

use atelier_core::models::AttributeDefinition;

use crate::normalize::normalize_key;

/// Exact match against the controlled vocabulary.
///
/// Both sides are collapsed via [`normalize_key`], so case, punctuation,
/// and whitespace differences are invisible. Full forms are checked before
/// short forms across the whole vocabulary, and raw values that are already
/// abbreviation codes hit the verbatim uppercase comparison. First hit
/// wins; the returned value is always the short form.
pub fn exact_match(raw: &str, def: &AttributeDefinition) -> Option<String> {
    let values = def.allowed_values.as_ref()?;
    let raw_key = normalize_key(raw);
    if raw_key.is_empty() {
        return None;
    }

    for v in values {
        if let Some(full) = &v.full_form {
            if normalize_key(full) == raw_key {
                return Some(v.short_form.clone());
            }
        }
    }

    let raw_upper = raw.trim().to_uppercase();
    for v in values {
        if normalize_key(&v.short_form) == raw_key || v.short_form.to_uppercase() == raw_upper {
            return Some(v.short_form.clone());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::models::{AllowedValue, AttributeDefinition};

    fn def() -> AttributeDefinition {
        AttributeDefinition::select(
            "neck_type",
            "Neck Type",
            vec![
                AllowedValue::new("RN", "Round Neck"),
                AllowedValue::new("VN", "V-Neck"),
                AllowedValue::code_only("PC"),
            ],
        )
    }

    #[test]
    fn test_full_form_case_insensitive() {
        assert_eq!(exact_match("round neck", &def()), Some("RN".into()));
        assert_eq!(exact_match("ROUND NECK", &def()), Some("RN".into()));
    }

    #[test]
    fn test_full_form_punctuation_and_whitespace() {
        assert_eq!(exact_match("Round-Neck", &def()), Some("RN".into()));
        assert_eq!(exact_match("  roundneck  ", &def()), Some("RN".into()));
        assert_eq!(exact_match("v neck", &def()), Some("VN".into()));
    }

    #[test]
    fn test_short_form_verbatim_code() {
        assert_eq!(exact_match("RN", &def()), Some("RN".into()));
        assert_eq!(exact_match("rn", &def()), Some("RN".into()));
        assert_eq!(exact_match("pc", &def()), Some("PC".into()));
    }

    #[test]
    fn test_idempotent_on_short_form() {
        // Normalizing a value already equal to a short form returns that
        // same short form unchanged.
        for code in ["RN", "VN", "PC"] {
            assert_eq!(exact_match(code, &def()), Some(code.to_string()));
        }
    }

    #[test]
    fn test_no_match() {
        assert_eq!(exact_match("boat neck", &def()), None);
        assert_eq!(exact_match("", &def()), None);
    }

    #[test]
    fn test_no_vocabulary() {
        let text_def = AttributeDefinition::text("remarks", "Remarks");
        assert_eq!(exact_match("anything", &text_def), None);
    }

    #[test]
    fn test_full_form_checked_before_short_form() {
        // "VN" as a full form of one value and short form of another:
        // the full-form pass wins.
        let def = AttributeDefinition::select(
            "x",
            "X",
            vec![
                AllowedValue::code_only("VN"),
                AllowedValue::new("OTHER", "VN"),
            ],
        );
        assert_eq!(exact_match("vn", &def), Some("OTHER".into()));
    }
}
