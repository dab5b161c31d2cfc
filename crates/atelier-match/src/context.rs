//! Cross-attribute batch context (diagnostics only).
//!
//! After a batch is normalized, a lightweight context is inferred from the
//! raw values: fabric family, garment type, and the color set. It annotates
//! logs and traces; it never gates a matching decision.

use std::collections::HashMap;

use atelier_core::models::RawAttributeValue;
use serde::{Deserialize, Serialize};

use crate::normalize::words;
use crate::synonyms::canonical_color;

/// Inferred context for one image's extraction results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchContext {
    /// "knit", "woven", or "denim" when any value mentions one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fabric_family: Option<String>,
    /// Coarse garment type when recognizable ("tshirt", "shirt", "dress",
    /// "hoodie", "pants").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub garment_type: Option<String>,
    /// Canonical colors mentioned anywhere, deduplicated, in first-seen
    /// order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
}

const FABRIC_FAMILIES: &[(&str, &[&str])] = &[
    ("denim", &["denim", "jean", "jeans", "chambray"]),
    ("knit", &["knit", "knitted", "jersey", "interlock", "pique", "fleece"]),
    ("woven", &["woven", "poplin", "twill", "oxford", "canvas"]),
];

const GARMENT_TYPES: &[(&str, &[&str])] = &[
    ("tshirt", &["tshirt", "tee", "tees"]),
    ("hoodie", &["hoodie", "hoody", "sweatshirt"]),
    ("dress", &["dress", "dresses", "gown"]),
    ("shirt", &["shirt", "shirts"]),
    ("pants", &["pants", "trousers", "slacks"]),
];

/// Infer the batch context from the raw (pre-normalization) values.
pub fn infer_context(raw: &HashMap<String, RawAttributeValue>) -> BatchContext {
    let mut ctx = BatchContext::default();

    for value in raw.values() {
        let Some(text) = &value.raw_value else { continue };
        for token in words(text) {
            if ctx.fabric_family.is_none() {
                if let Some((family, _)) = FABRIC_FAMILIES
                    .iter()
                    .find(|(_, kws)| kws.contains(&token.as_str()))
                {
                    ctx.fabric_family = Some(family.to_string());
                }
            }
            if ctx.garment_type.is_none() {
                if let Some((garment, _)) = GARMENT_TYPES
                    .iter()
                    .find(|(_, kws)| kws.contains(&token.as_str()))
                {
                    ctx.garment_type = Some(garment.to_string());
                }
            }
            if let Some(color) = canonical_color(&token) {
                if !ctx.colors.iter().any(|c| c == color) {
                    ctx.colors.push(color.to_string());
                }
            }
        }
    }

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, RawAttributeValue> {
        pairs
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    RawAttributeValue {
                        raw_value: Some(v.to_string()),
                        confidence: 80.0,
                        reasoning: String::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_infer_fabric_and_garment() {
        let ctx = infer_context(&raw(&[
            ("fab_type", "single jersey knit"),
            ("macro_style_group", "graphic tee"),
        ]));
        assert_eq!(ctx.fabric_family.as_deref(), Some("knit"));
        assert_eq!(ctx.garment_type.as_deref(), Some("tshirt"));
    }

    #[test]
    fn test_infer_colors_canonical_and_deduplicated() {
        let ctx = infer_context(&raw(&[
            ("color", "navy with charcoal trim"),
            ("secondary_color", "blue"),
        ]));
        assert_eq!(ctx.colors.len(), 2);
        assert!(ctx.colors.contains(&"blue".to_string()));
        assert!(ctx.colors.contains(&"grey".to_string()));
    }

    #[test]
    fn test_empty_input() {
        let ctx = infer_context(&HashMap::new());
        assert_eq!(ctx, BatchContext::default());
    }

    #[test]
    fn test_none_values_skipped() {
        let mut map = HashMap::new();
        map.insert(
            "x".to_string(),
            RawAttributeValue {
                raw_value: None,
                confidence: 0.0,
                reasoning: String::new(),
            },
        );
        assert_eq!(infer_context(&map), BatchContext::default());
    }
}
