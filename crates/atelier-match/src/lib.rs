//! # atelier-match
//!
//! Attribute normalization engine for atelier: maps raw values extracted
//! by a vision model onto a controlled garment vocabulary.
//!
//! This crate provides:
//! - Non-answer and filler detection ("N/A", "various", a bare "plain")
//! - Exact vocabulary matching on full and short forms
//! - An ordered table of domain safeguard rules ("jersey" is a knit)
//! - Semantic token matching through a fashion synonym dictionary
//! - Weighted fuzzy similarity with abbreviation and plural handling
//! - Size and GSM range detection ("s.xxl" to "S-XXL")
//! - Structured decision traces for every normalized value
//!
//! ## Example
//!
//! ```
//! use atelier_core::models::{AllowedValue, AttributeDefinition};
//! use atelier_match::{process_extraction_result, Resolution};
//!
//! let def = AttributeDefinition::select(
//!     "neck_type",
//!     "Neck Type",
//!     vec![AllowedValue::new("RN", "Round Neck")],
//! );
//!
//! let out = process_extraction_result("neck_type", Some("Round-Neck"), &def);
//! assert_eq!(out.value.as_deref(), Some("RN"));
//! assert_eq!(out.resolution, Resolution::Vocabulary);
//! ```

pub mod context;
pub mod exact;
pub mod fuzzy;
pub mod normalize;
pub mod null_like;
pub mod processor;
pub mod range;
pub mod rules;
pub mod semantic;
pub mod synonyms;
pub mod trace;

// Re-export core types
pub use atelier_core::*;

// Re-export the matcher surface
pub use context::{infer_context, BatchContext};
pub use exact::exact_match;
pub use fuzzy::{fuzzy_match, string_similarity, FuzzyHit};
pub use null_like::{is_filler, is_null_like, is_valid_raw_value};
pub use processor::{process_batch_results, process_extraction_result};
pub use range::{detect_gsm_range, detect_range, detect_size_range};
pub use rules::{apply_safeguards, KeyScope, RuleAction, SafeguardHit, SafeguardRule, RULES};
pub use semantic::{semantic_match, SemanticHit};
pub use synonyms::{token_affinity, SynonymEntry, SYNONYMS};
pub use trace::{DecisionTrace, MatchOutcome, Resolution, Stage, TraceStep};
