//! Size and GSM range detection (stage 6).
//!
//! Only consulted when the attribute opted in via `range_config` and every
//! vocabulary stage has failed. Raw values here come from handwritten
//! measurement sheets photographed at an angle, so the cleaning pass treats dots,
//! slashes, commas, and stray spaces as the same separator.

use atelier_core::models::RangeType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical size ladder, smallest to largest.
const SIZE_ORDER: &[&str] = &[
    "XXS", "XS", "S", "M", "L", "XL", "XXL", "XXXL", "4XL", "5XL",
];

/// Two-word verbose size forms, checked before single tokens.
const SIZE_ALIASES_2: &[(&str, &str, &str)] = &[
    ("extra", "small", "XS"),
    ("extra", "large", "XXL"),
    ("double", "xl", "XXL"),
    ("triple", "xl", "XXXL"),
];

/// Single-token size forms.
const SIZE_ALIASES_1: &[(&str, &str)] = &[
    ("xxs", "XXS"),
    ("xs", "XS"),
    ("s", "S"),
    ("small", "S"),
    ("m", "M"),
    ("med", "M"),
    ("medium", "M"),
    ("l", "L"),
    ("large", "L"),
    ("xl", "XL"),
    ("xlarge", "XL"),
    ("xxl", "XXL"),
    ("2xl", "XXL"),
    ("xxxl", "XXXL"),
    ("3xl", "XXXL"),
    ("4xl", "4XL"),
    ("5xl", "5XL"),
];

/// Connector words dropped between range endpoints.
const RANGE_CONNECTORS: &[&str] = &["to", "thru", "through", "till", "upto", "and"];

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Collapse handwriting separators into spaces and split.
fn clean_tokens(raw: &str) -> Vec<String> {
    raw.to_lowercase()
        .split(|c: char| c.is_whitespace() || matches!(c, '.' | '/' | ',' | '-' | '–' | '~' | '|'))
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Map the token stream to canonical sizes, greedily consuming two-word
/// forms first.
fn map_sizes(tokens: &[String]) -> Vec<&'static str> {
    let mut sizes = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if i + 1 < tokens.len() {
            if let Some((_, _, size)) = SIZE_ALIASES_2
                .iter()
                .find(|(a, b, _)| *a == tokens[i] && *b == tokens[i + 1])
            {
                sizes.push(*size);
                i += 2;
                continue;
            }
        }
        if let Some((_, size)) = SIZE_ALIASES_1.iter().find(|(a, _)| *a == tokens[i]) {
            sizes.push(*size);
        } else if !RANGE_CONNECTORS.contains(&tokens[i].as_str()) {
            // An unrecognized token means this is not a size string.
            return Vec::new();
        }
        i += 1;
    }
    sizes
}

/// Reduce a raw value to a canonical size or size range ("S" / "S-XXL").
pub fn detect_size_range(raw: &str) -> Option<String> {
    let tokens = clean_tokens(raw);
    if tokens.is_empty() {
        return None;
    }
    let sizes = map_sizes(&tokens);
    match sizes.len() {
        0 => None,
        1 => Some(sizes[0].to_string()),
        _ => Some(format!("{}-{}", sizes[0], sizes[sizes.len() - 1])),
    }
}

/// Reduce a raw value to a canonical GSM value or range ("135G" /
/// "180-220G"). All embedded numbers are extracted after separator
/// cleanup; first and last bound the range.
pub fn detect_gsm_range(raw: &str) -> Option<String> {
    let cleaned = raw
        .to_lowercase()
        .replace(|c: char| matches!(c, '.' | '/' | ',' | '-' | '–' | '~' | '|'), " ");
    let numbers: Vec<&str> = NUMBER_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .collect();
    match numbers.len() {
        0 => None,
        1 => Some(format!("{}G", numbers[0])),
        _ => Some(format!("{}-{}G", numbers[0], numbers[numbers.len() - 1])),
    }
}

/// Plain numeric range, no unit suffix ("40" / "40-44").
pub fn detect_numeric_range(raw: &str) -> Option<String> {
    let cleaned = raw
        .to_lowercase()
        .replace(|c: char| matches!(c, '.' | '/' | ',' | '-' | '–' | '~' | '|'), " ");
    let numbers: Vec<&str> = NUMBER_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .collect();
    match numbers.len() {
        0 => None,
        1 => Some(numbers[0].to_string()),
        _ => Some(format!("{}-{}", numbers[0], numbers[numbers.len() - 1])),
    }
}

/// Dispatch on the attribute's configured range type.
pub fn detect_range(raw: &str, range_type: RangeType) -> Option<String> {
    match range_type {
        RangeType::Size => detect_size_range(raw),
        RangeType::Gsm => detect_gsm_range(raw),
        RangeType::Numeric | RangeType::Custom => detect_numeric_range(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_range_separator_variants() {
        for raw in ["S-XXL", "s.xxl", "S / XXL", "small to extra large", "S , XXL"] {
            assert_eq!(
                detect_size_range(raw).as_deref(),
                Some("S-XXL"),
                "failed for {raw:?}"
            );
        }
    }

    #[test]
    fn test_size_single() {
        assert_eq!(detect_size_range("M").as_deref(), Some("M"));
        assert_eq!(detect_size_range("medium").as_deref(), Some("M"));
        assert_eq!(detect_size_range("extra small").as_deref(), Some("XS"));
    }

    #[test]
    fn test_size_multi_token_takes_first_and_last() {
        assert_eq!(detect_size_range("S M L XL").as_deref(), Some("S-XL"));
        assert_eq!(detect_size_range("s/m/l/xl/xxl").as_deref(), Some("S-XXL"));
    }

    #[test]
    fn test_size_verbose_forms() {
        assert_eq!(detect_size_range("3xl").as_deref(), Some("XXXL"));
        assert_eq!(detect_size_range("triple xl").as_deref(), Some("XXXL"));
        assert_eq!(detect_size_range("med to large").as_deref(), Some("M-L"));
    }

    #[test]
    fn test_size_rejects_non_size_strings() {
        assert!(detect_size_range("round neck").is_none());
        assert!(detect_size_range("").is_none());
        assert!(detect_size_range("slim fit").is_none());
    }

    #[test]
    fn test_gsm_range_variants() {
        for raw in ["180-220g", "180.220G", "180 to 220 grams", "180 / 220 gsm"] {
            assert_eq!(
                detect_gsm_range(raw).as_deref(),
                Some("180-220G"),
                "failed for {raw:?}"
            );
        }
    }

    #[test]
    fn test_gsm_single() {
        assert_eq!(detect_gsm_range("135G").as_deref(), Some("135G"));
        assert_eq!(detect_gsm_range("around 200 gsm").as_deref(), Some("200G"));
    }

    #[test]
    fn test_gsm_no_numbers() {
        assert!(detect_gsm_range("heavyweight").is_none());
        assert!(detect_gsm_range("").is_none());
    }

    #[test]
    fn test_numeric_range() {
        assert_eq!(detect_numeric_range("40-44").as_deref(), Some("40-44"));
        assert_eq!(detect_numeric_range("size 40").as_deref(), Some("40"));
        assert!(detect_numeric_range("none").is_none());
    }

    #[test]
    fn test_dispatch() {
        assert_eq!(
            detect_range("s.xxl", RangeType::Size).as_deref(),
            Some("S-XXL")
        );
        assert_eq!(
            detect_range("135g", RangeType::Gsm).as_deref(),
            Some("135G")
        );
        assert_eq!(
            detect_range("40,44", RangeType::Numeric).as_deref(),
            Some("40-44")
        );
    }

    #[test]
    fn test_size_order_covers_aliases() {
        for (_, size) in SIZE_ALIASES_1 {
            assert!(SIZE_ORDER.contains(size), "{size} missing from ladder");
        }
    }
}
