//! Domain safeguard rules (stage 3).
//!
//! A single ordered table of pattern-to-code mappings scoped to specific
//! attribute families. Rules encode domain knowledge the generic stages get
//! wrong: "jersey" is a knit even though the strings share no tokens, a
//! bare "plain" must never silently pick a neck style, and "no pockets"
//! means there is nothing to match.
//!
//! A rule fires only when its key scope matches the attribute AND its
//! target code actually exists in that attribute's vocabulary. Rules are
//! evaluated top to bottom; the first firing rule decides.

use atelier_core::models::AttributeDefinition;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::contains_negation;

/// Which attribute keys a rule applies to.
#[derive(Debug, Clone, Copy)]
pub enum KeyScope {
    /// Exactly this key.
    Exact(&'static str),
    /// Any of these keys.
    AnyOf(&'static [&'static str]),
}

impl KeyScope {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyScope::Exact(k) => *k == key,
            KeyScope::AnyOf(ks) => ks.contains(&key),
        }
    }
}

/// What a firing rule does.
#[derive(Debug, Clone, Copy)]
pub enum RuleAction {
    /// Map to this code, if the vocabulary has it.
    ForceMap(&'static str),
    /// Map to `primary` if present in the vocabulary, else `secondary`.
    Fallback {
        primary: &'static str,
        secondary: &'static str,
    },
    /// The text signals absence or ambiguity: return no value at all.
    Block,
}

/// One safeguard rule. `pattern` is compiled case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct SafeguardRule {
    pub name: &'static str,
    pub scope: KeyScope,
    pub pattern: &'static str,
    pub action: RuleAction,
}

const FABRIC_KEYS: &[&str] = &["fab_type", "fabric_type"];
const SLEEVE_KEYS: &[&str] = &["sleeve_length", "slv_length"];
const POCKET_KEYS: &[&str] = &["pocket_type", "pockets"];
const NECK_KEYS: &[&str] = &["neck_type", "neckline"];

/// The ordered safeguard table. Order matters: absence/ambiguity blocks
/// come before positive mappings within each family.
pub static RULES: &[SafeguardRule] = &[
    // ── Fabric type: knit / denim / woven ─────────────────────────────
    SafeguardRule {
        name: "fabric_denim",
        scope: KeyScope::AnyOf(FABRIC_KEYS),
        pattern: r"\bdenims?\b|\bjeans?\b|\bchambray\b",
        action: RuleAction::ForceMap("DEN"),
    },
    SafeguardRule {
        name: "fabric_knit",
        scope: KeyScope::AnyOf(FABRIC_KEYS),
        pattern: r"\bknit(ted)?\b|\bjersey\b|\bribb?(ed)?\b|\binterlock\b|\bpique\b|\bfleece\b",
        action: RuleAction::ForceMap("KNT"),
    },
    SafeguardRule {
        name: "fabric_woven",
        scope: KeyScope::AnyOf(FABRIC_KEYS),
        pattern: r"\bwoven\b|\bpoplin\b|\btwill\b|\boxford\b|\bcanvas\b|\bflannel\b",
        action: RuleAction::ForceMap("WVN"),
    },
    // ── Sleeve length ─────────────────────────────────────────────────
    SafeguardRule {
        name: "sleeve_less",
        scope: KeyScope::AnyOf(SLEEVE_KEYS),
        pattern: r"sleeve\s*less|\bno\s+sleeves?\b|\btank\b",
        action: RuleAction::ForceMap("SL"),
    },
    SafeguardRule {
        name: "sleeve_three_quarter",
        scope: KeyScope::AnyOf(SLEEVE_KEYS),
        pattern: r"three\s*quarter|\b3\s*/\s*4\b",
        action: RuleAction::ForceMap("TQS"),
    },
    SafeguardRule {
        name: "sleeve_full",
        scope: KeyScope::AnyOf(SLEEVE_KEYS),
        pattern: r"\bfull\b|\blong\b",
        action: RuleAction::ForceMap("FS"),
    },
    SafeguardRule {
        name: "sleeve_half",
        scope: KeyScope::AnyOf(SLEEVE_KEYS),
        pattern: r"\bhalf\b|\bshort\b|\belbow\b",
        action: RuleAction::ForceMap("HS"),
    },
    SafeguardRule {
        name: "sleeve_cap",
        scope: KeyScope::AnyOf(SLEEVE_KEYS),
        pattern: r"\bcap\b",
        action: RuleAction::ForceMap("CS"),
    },
    // ── Pocket type ───────────────────────────────────────────────────
    SafeguardRule {
        name: "pocket_absent",
        scope: KeyScope::AnyOf(POCKET_KEYS),
        pattern: r"\b(no|without)\b.*\bpockets?\b|pocket\s*less",
        action: RuleAction::Block,
    },
    SafeguardRule {
        name: "pocket_kangaroo",
        scope: KeyScope::AnyOf(POCKET_KEYS),
        pattern: r"\bkangaroo\b|\bpouch\b",
        action: RuleAction::ForceMap("KNG"),
    },
    SafeguardRule {
        name: "pocket_patch",
        scope: KeyScope::AnyOf(POCKET_KEYS),
        pattern: r"\bpatch\b",
        action: RuleAction::ForceMap("PAT"),
    },
    SafeguardRule {
        name: "pocket_welt",
        scope: KeyScope::AnyOf(POCKET_KEYS),
        pattern: r"\bwelt\b|\bbesom\b",
        action: RuleAction::ForceMap("WLT"),
    },
    SafeguardRule {
        name: "pocket_side_seam",
        scope: KeyScope::AnyOf(POCKET_KEYS),
        pattern: r"side\s*seam|\binseam\b|\bside\b",
        action: RuleAction::Fallback {
            primary: "SS",
            secondary: "PAT",
        },
    },
    // ── Neckline ──────────────────────────────────────────────────────
    // A bare "plain" is ambiguous for neck construction and must not
    // silently match any neck style.
    SafeguardRule {
        name: "neck_plain_ambiguous",
        scope: KeyScope::AnyOf(NECK_KEYS),
        pattern: r"^\s*plain\s*$",
        action: RuleAction::Block,
    },
    SafeguardRule {
        name: "neck_crew_round",
        scope: KeyScope::AnyOf(NECK_KEYS),
        pattern: r"\bcrew\b|\bround\b",
        action: RuleAction::ForceMap("RN"),
    },
    SafeguardRule {
        name: "neck_v",
        scope: KeyScope::AnyOf(NECK_KEYS),
        pattern: r"\bv[\s-]?necks?\b",
        action: RuleAction::ForceMap("VN"),
    },
    SafeguardRule {
        name: "neck_polo_collar",
        scope: KeyScope::AnyOf(NECK_KEYS),
        pattern: r"\bpolo\b|\bcollar(ed)?\b",
        action: RuleAction::Fallback {
            primary: "PC",
            secondary: "CLR",
        },
    },
    SafeguardRule {
        name: "neck_boat",
        scope: KeyScope::AnyOf(NECK_KEYS),
        pattern: r"\bboat\b|\bbateau\b",
        action: RuleAction::ForceMap("BN"),
    },
    SafeguardRule {
        name: "neck_mandarin",
        scope: KeyScope::AnyOf(NECK_KEYS),
        pattern: r"\bmandarin\b|\bband\b",
        action: RuleAction::ForceMap("MND"),
    },
    SafeguardRule {
        name: "neck_turtle",
        scope: KeyScope::AnyOf(NECK_KEYS),
        pattern: r"turtle\s*neck|\bhigh\s+neck\b",
        action: RuleAction::ForceMap("TN"),
    },
    // ── Macro style group ─────────────────────────────────────────────
    SafeguardRule {
        name: "macro_tshirt",
        scope: KeyScope::Exact("macro_style_group"),
        pattern: r"\bt[\s-]?shirts?\b|\btees?\b",
        action: RuleAction::ForceMap("TSH"),
    },
    SafeguardRule {
        name: "macro_shirt",
        scope: KeyScope::Exact("macro_style_group"),
        pattern: r"\bshirts?\b",
        action: RuleAction::ForceMap("SHT"),
    },
    SafeguardRule {
        name: "macro_dress",
        scope: KeyScope::Exact("macro_style_group"),
        pattern: r"\bdress(es)?\b|\bgowns?\b",
        action: RuleAction::ForceMap("DRS"),
    },
    SafeguardRule {
        name: "macro_hoodie",
        scope: KeyScope::Exact("macro_style_group"),
        pattern: r"\bhood(ie|ed|y)s?\b|\bsweat\s*shirts?\b",
        action: RuleAction::ForceMap("HDY"),
    },
    // ── Micro style group ─────────────────────────────────────────────
    SafeguardRule {
        name: "micro_graphic_tee",
        scope: KeyScope::Exact("micro_style_group"),
        pattern: r"\bgraphic\b|\bprinted\s+tee\b",
        action: RuleAction::ForceMap("GRT"),
    },
    SafeguardRule {
        name: "micro_henley",
        scope: KeyScope::Exact("micro_style_group"),
        pattern: r"\bhenley\b",
        action: RuleAction::ForceMap("HNL"),
    },
    // ── Pattern ───────────────────────────────────────────────────────
    // "plain" IS a meaningful pattern value (solid), unlike for necklines.
    SafeguardRule {
        name: "pattern_solid",
        scope: KeyScope::Exact("pattern"),
        pattern: r"\bsolids?\b|\bplain\b",
        action: RuleAction::ForceMap("SLD"),
    },
    SafeguardRule {
        name: "pattern_stripe",
        scope: KeyScope::Exact("pattern"),
        pattern: r"\bstripes?\b|\bstriped\b",
        action: RuleAction::ForceMap("STR"),
    },
    SafeguardRule {
        name: "pattern_check",
        scope: KeyScope::Exact("pattern"),
        pattern: r"\bchecks?\b|\bchecked\b|\bplaid\b|\bgingham\b|\btartan\b",
        action: RuleAction::ForceMap("CHK"),
    },
    SafeguardRule {
        name: "pattern_floral",
        scope: KeyScope::Exact("pattern"),
        pattern: r"\bflorals?\b|\bflowers?\b",
        action: RuleAction::ForceMap("FLR"),
    },
    SafeguardRule {
        name: "pattern_dot",
        scope: KeyScope::Exact("pattern"),
        pattern: r"\bpolka\b|\bdots?\b|\bdotted\b",
        action: RuleAction::ForceMap("DOT"),
    },
    // ── Embroidery ────────────────────────────────────────────────────
    SafeguardRule {
        name: "emb_absent",
        scope: KeyScope::Exact("emb_type"),
        pattern: r"\b(no|without)\b.*\bembroider(y|ed|ies)?\b",
        action: RuleAction::Block,
    },
    SafeguardRule {
        name: "emb_thread",
        scope: KeyScope::Exact("emb_type"),
        pattern: r"thread\s*work|\bthread(ed)?\b",
        action: RuleAction::ForceMap("THR"),
    },
    SafeguardRule {
        name: "emb_sequin",
        scope: KeyScope::Exact("emb_type"),
        pattern: r"\bsequins?\b|\bsequinn?ed\b",
        action: RuleAction::ForceMap("SEQ"),
    },
    SafeguardRule {
        name: "emb_bead",
        scope: KeyScope::Exact("emb_type"),
        pattern: r"\bbead(s|ed|work)?\b",
        action: RuleAction::ForceMap("BDW"),
    },
    SafeguardRule {
        name: "emb_place_chest",
        scope: KeyScope::Exact("emb_placement"),
        pattern: r"\bchest\b",
        action: RuleAction::ForceMap("CHE"),
    },
    SafeguardRule {
        name: "emb_place_all_over",
        scope: KeyScope::Exact("emb_placement"),
        pattern: r"all[\s-]?over",
        action: RuleAction::ForceMap("AOV"),
    },
    SafeguardRule {
        name: "emb_place_sleeve",
        scope: KeyScope::Exact("emb_placement"),
        pattern: r"\bsleeves?\b|\bcuffs?\b",
        action: RuleAction::ForceMap("SLV"),
    },
    SafeguardRule {
        name: "emb_place_back",
        scope: KeyScope::Exact("emb_placement"),
        pattern: r"\bback\b",
        action: RuleAction::ForceMap("BCK"),
    },
    SafeguardRule {
        name: "emb_tech_machine",
        scope: KeyScope::Exact("emb_technique"),
        pattern: r"\bmachine\b|\bcomputeri[sz]ed\b",
        action: RuleAction::ForceMap("MCH"),
    },
    SafeguardRule {
        name: "emb_tech_hand",
        scope: KeyScope::Exact("emb_technique"),
        pattern: r"\bhand\b|\bartisanal\b",
        action: RuleAction::ForceMap("HND"),
    },
    // ── Fiber composition blends ──────────────────────────────────────
    SafeguardRule {
        name: "comp_pure_cotton",
        scope: KeyScope::Exact("fab_composition"),
        pattern: r"100\s*%?\s*cotton|\bpure\s+cotton\b|\ball\s+cotton\b",
        action: RuleAction::ForceMap("100CTN"),
    },
    SafeguardRule {
        name: "comp_pure_polyester",
        scope: KeyScope::Exact("fab_composition"),
        pattern: r"100\s*%?\s*poly(ester)?\b",
        action: RuleAction::ForceMap("100PES"),
    },
    SafeguardRule {
        name: "comp_cotton_elastane",
        scope: KeyScope::Exact("fab_composition"),
        pattern: r"\bcotton\b.*\b(elastane|spandex|lycra)\b|\b(elastane|spandex|lycra)\b.*\bcotton\b",
        action: RuleAction::ForceMap("CTN_ELA"),
    },
    SafeguardRule {
        name: "comp_poly_cotton",
        scope: KeyScope::Exact("fab_composition"),
        pattern: r"\bcotton\b.*\bpoly(ester)?\b|\bpoly(ester)?\b.*\bcotton\b|\bpc\s+blend\b",
        action: RuleAction::ForceMap("PC_BLEND"),
    },
    SafeguardRule {
        name: "comp_viscose_blend",
        scope: KeyScope::Exact("fab_composition"),
        pattern: r"\bviscose\b|\brayon\b|\bmodal\b",
        action: RuleAction::ForceMap("VIS_BLEND"),
    },
];

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|r| {
            Regex::new(&format!("(?i){}", r.pattern))
                .unwrap_or_else(|e| panic!("invalid safeguard pattern '{}': {e}", r.name))
        })
        .collect()
});

/// Rules whose pattern itself encodes absence. For these the negation is
/// the signal: "no sleeves" genuinely means Sleeveless.
const NEGATION_EXEMPT: &[&str] = &["sleeve_less"];

/// Result of a firing safeguard rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeguardHit {
    pub rule_name: &'static str,
    /// The mapped code, or None when the rule blocked the match.
    pub code: Option<String>,
}

/// Evaluate the safeguard table for one attribute value.
///
/// Returns None when no rule fired (the pipeline moves on to the next
/// stage). Rules mapping to codes absent from this attribute's vocabulary
/// are skipped, never invented.
///
/// Negated input ("without collar", "no pouch") must never force a
/// positive mapping: a negated mention of a family term is treated as an
/// absence signal and blocks instead, unless the rule's own pattern
/// encodes the absence.
pub fn apply_safeguards(key: &str, raw: &str, def: &AttributeDefinition) -> Option<SafeguardHit> {
    let negated = contains_negation(raw);
    for (rule, re) in RULES.iter().zip(COMPILED.iter()) {
        if !rule.scope.matches(key) || !re.is_match(raw) {
            continue;
        }
        if negated
            && !matches!(rule.action, RuleAction::Block)
            && !NEGATION_EXEMPT.contains(&rule.name)
        {
            return Some(SafeguardHit {
                rule_name: rule.name,
                code: None,
            });
        }
        match rule.action {
            RuleAction::Block => {
                return Some(SafeguardHit {
                    rule_name: rule.name,
                    code: None,
                });
            }
            RuleAction::ForceMap(code) => {
                if def.has_code(code) {
                    return Some(SafeguardHit {
                        rule_name: rule.name,
                        code: Some(code.to_string()),
                    });
                }
            }
            RuleAction::Fallback { primary, secondary } => {
                let chosen = if def.has_code(primary) {
                    Some(primary)
                } else if def.has_code(secondary) {
                    Some(secondary)
                } else {
                    None
                };
                if let Some(code) = chosen {
                    return Some(SafeguardHit {
                        rule_name: rule.name,
                        code: Some(code.to_string()),
                    });
                }
            }
        }
    }
    None
}
