//! Curated fashion-domain synonym dictionary.
//!
//! Each entry maps a canonical vocabulary term to the variants the vision
//! model actually emits, with a per-mapping confidence. Confidences follow
//! how interchangeable the terms are in garment descriptions: "crew" is a
//! round neck (0.97), but "navy" is only probably "blue" (0.88).

/// One synonym group.
#[derive(Debug, Clone, Copy)]
pub struct SynonymEntry {
    /// The canonical term as it appears in vocabulary full forms.
    pub canonical: &'static str,
    pub synonyms: &'static [&'static str],
    /// Confidence (0.0-1.0) that a synonym means the canonical term.
    pub confidence: f64,
}

/// The dictionary. Grouped by domain; order is irrelevant (lookups scan).
pub static SYNONYMS: &[SynonymEntry] = &[
    // ── Necklines ──────────────────────────────────────────────────────
    SynonymEntry { canonical: "round", synonyms: &["crew", "crewneck", "circular"], confidence: 0.97 },
    SynonymEntry { canonical: "turtleneck", synonyms: &["rollneck", "poloneck", "highneck"], confidence: 0.92 },
    SynonymEntry { canonical: "boat", synonyms: &["bateau"], confidence: 0.95 },
    SynonymEntry { canonical: "mandarin", synonyms: &["band", "grandad"], confidence: 0.88 },
    // ── Sleeve lengths ─────────────────────────────────────────────────
    SynonymEntry { canonical: "full", synonyms: &["long"], confidence: 0.95 },
    SynonymEntry { canonical: "half", synonyms: &["short", "elbow"], confidence: 0.93 },
    SynonymEntry { canonical: "sleeveless", synonyms: &["tank", "vest"], confidence: 0.90 },
    // ── Fabrics ────────────────────────────────────────────────────────
    SynonymEntry { canonical: "knit", synonyms: &["knitted", "jersey", "interlock", "pique"], confidence: 0.94 },
    SynonymEntry { canonical: "woven", synonyms: &["poplin", "twill", "oxford"], confidence: 0.90 },
    SynonymEntry { canonical: "denim", synonyms: &["jean", "chambray"], confidence: 0.92 },
    SynonymEntry { canonical: "cotton", synonyms: &["cottons"], confidence: 0.99 },
    SynonymEntry { canonical: "polyester", synonyms: &["poly", "pes"], confidence: 0.95 },
    SynonymEntry { canonical: "elastane", synonyms: &["spandex", "lycra"], confidence: 0.97 },
    SynonymEntry { canonical: "wool", synonyms: &["woolen", "merino"], confidence: 0.93 },
    SynonymEntry { canonical: "linen", synonyms: &["flax"], confidence: 0.94 },
    // ── Patterns ───────────────────────────────────────────────────────
    SynonymEntry { canonical: "solid", synonyms: &["plain", "unpatterned"], confidence: 0.93 },
    SynonymEntry { canonical: "stripe", synonyms: &["striped", "stripes", "pinstripe"], confidence: 0.96 },
    SynonymEntry { canonical: "check", synonyms: &["checked", "plaid", "gingham", "tartan"], confidence: 0.92 },
    SynonymEntry { canonical: "floral", synonyms: &["flower", "flowers", "botanical"], confidence: 0.93 },
    SynonymEntry { canonical: "dot", synonyms: &["polka", "dotted", "spotted"], confidence: 0.91 },
    SynonymEntry { canonical: "print", synonyms: &["printed", "graphic"], confidence: 0.85 },
    // ── Colors ─────────────────────────────────────────────────────────
    SynonymEntry { canonical: "red", synonyms: &["crimson", "scarlet", "maroon", "burgundy"], confidence: 0.88 },
    SynonymEntry { canonical: "blue", synonyms: &["navy", "cobalt", "azure", "indigo"], confidence: 0.88 },
    SynonymEntry { canonical: "green", synonyms: &["olive", "emerald", "sage"], confidence: 0.86 },
    SynonymEntry { canonical: "grey", synonyms: &["gray", "charcoal", "slate"], confidence: 0.92 },
    SynonymEntry { canonical: "beige", synonyms: &["tan", "khaki", "sand", "ecru"], confidence: 0.84 },
    SynonymEntry { canonical: "white", synonyms: &["ivory", "cream", "offwhite"], confidence: 0.87 },
    SynonymEntry { canonical: "black", synonyms: &["jet", "onyx"], confidence: 0.93 },
    SynonymEntry { canonical: "pink", synonyms: &["rose", "blush", "fuchsia"], confidence: 0.85 },
    // ── Garment types ──────────────────────────────────────────────────
    SynonymEntry { canonical: "tshirt", synonyms: &["tee", "tshirts", "tees"], confidence: 0.98 },
    SynonymEntry { canonical: "sweater", synonyms: &["jumper", "pullover"], confidence: 0.90 },
    SynonymEntry { canonical: "pants", synonyms: &["trousers", "slacks"], confidence: 0.95 },
    SynonymEntry { canonical: "hoodie", synonyms: &["hooded", "hoody"], confidence: 0.91 },
    SynonymEntry { canonical: "camisole", synonyms: &["cami"], confidence: 0.94 },
];

/// Confidence that two tokens refer to the same term: 1.0 for identical
/// tokens, the dictionary confidence when one is a synonym of the other
/// (either direction, or both synonyms of the same canonical), else None.
pub fn token_affinity(a: &str, b: &str) -> Option<f64> {
    if a == b {
        return Some(1.0);
    }
    for entry in SYNONYMS {
        let a_in = entry.canonical == a || entry.synonyms.contains(&a);
        let b_in = entry.canonical == b || entry.synonyms.contains(&b);
        if a_in && b_in {
            return Some(entry.confidence);
        }
    }
    None
}

/// The canonical color for a token, used by the batch-context inference.
pub fn canonical_color(token: &str) -> Option<&'static str> {
    const COLORS: &[&str] = &[
        "red", "blue", "green", "grey", "beige", "white", "black", "pink",
        "yellow", "orange", "purple", "brown",
    ];
    if let Some(c) = COLORS.iter().find(|c| **c == token) {
        return Some(c);
    }
    for entry in SYNONYMS {
        if COLORS.contains(&entry.canonical) && entry.synonyms.contains(&token) {
            return Some(entry.canonical);
        }
    }
    None
}
