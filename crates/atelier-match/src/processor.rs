//! The normalization pipeline.
//!
//! One raw extracted value enters, one [`MatchOutcome`] leaves. Stages run
//! in a fixed order and the first decisive stage wins:
//!
//! 1. hard non-answer filter
//! 2. exact vocabulary match
//! 3. domain safeguard rules
//! 4. generic filler filter
//! 5. semantic token match
//! 6. weighted fuzzy similarity
//! 7. size/GSM range detection (opt-in per attribute)
//! 8. raw-value fallback
//!
//! The filler check deliberately runs *after* exact and safeguard so that
//! an attribute whose vocabulary legitimately claims a filler word (a
//! "plain" pattern is the solid code) still matches, while the same word
//! nulls out everywhere else.
//!
//! The pipeline never fails: any raw value and any definition produce an
//! outcome, and the raw value is preserved verbatim on the record.

use std::collections::HashMap;

use atelier_core::defaults;
use atelier_core::models::{
    AttributeDefinition, AttributeRecord, RawAttributeValue, SchemaMap,
};

use crate::context::{infer_context, BatchContext};
use crate::exact::exact_match;
use crate::fuzzy::fuzzy_match;
use crate::null_like::{is_filler, is_null_like, is_valid_raw_value};
use crate::range::detect_range;
use crate::rules::apply_safeguards;
use crate::semantic::semantic_match;
use crate::trace::{DecisionTrace, MatchOutcome, Resolution, Stage};

fn outcome(
    value: Option<String>,
    resolution: Resolution,
    confidence: f64,
    trace: DecisionTrace,
) -> MatchOutcome {
    MatchOutcome {
        value,
        resolution,
        confidence,
        trace,
    }
}

/// Normalize one raw value against one attribute definition.
pub fn process_extraction_result(
    key: &str,
    raw: Option<&str>,
    def: &AttributeDefinition,
) -> MatchOutcome {
    let mut trace = DecisionTrace::default();

    // Stage 1: hard non-answers. Missing values short-circuit everything.
    let raw = match raw {
        Some(r) if !is_null_like(r) => r,
        _ => {
            trace.push(Stage::NullLike, None, None, true);
            return outcome(None, Resolution::Absent, 0.0, trace);
        }
    };

    // Stage 2: exact vocabulary match.
    if let Some(code) = exact_match(raw, def) {
        trace.push(Stage::Exact, Some(code.clone()), Some(1.0), true);
        tracing::debug!(attribute_key = key, stage = %Stage::Exact, candidate = %code, "matched");
        return outcome(
            Some(code),
            Resolution::Vocabulary,
            defaults::EXACT_MATCH_CONFIDENCE,
            trace,
        );
    }
    trace.push(Stage::Exact, None, None, false);

    // Stage 3: domain safeguards. A firing rule decides outright, whether
    // it maps or blocks.
    if let Some(hit) = apply_safeguards(key, raw, def) {
        match hit.code {
            Some(code) => {
                trace.push(Stage::Safeguard, Some(code.clone()), None, true);
                tracing::debug!(
                    attribute_key = key,
                    stage = %Stage::Safeguard,
                    rule = hit.rule_name,
                    candidate = %code,
                    "matched"
                );
                return outcome(
                    Some(code),
                    Resolution::Vocabulary,
                    defaults::RULE_MATCH_CONFIDENCE,
                    trace,
                );
            }
            None => {
                trace.push(Stage::Safeguard, None, None, true);
                tracing::debug!(
                    attribute_key = key,
                    stage = %Stage::Safeguard,
                    rule = hit.rule_name,
                    "blocked"
                );
                return outcome(None, Resolution::Absent, 0.0, trace);
            }
        }
    }
    trace.push(Stage::Safeguard, None, None, false);

    // Stage 4: generic filler. Nothing claimed the word, so it is a shrug.
    if is_filler(raw) {
        trace.push(Stage::Filler, None, None, true);
        return outcome(None, Resolution::Absent, 0.0, trace);
    }

    // Stage 5: semantic token match.
    if let Some(hit) = semantic_match(raw, def) {
        trace.push(Stage::Semantic, Some(hit.code.clone()), Some(hit.score), true);
        tracing::debug!(
            attribute_key = key,
            stage = %Stage::Semantic,
            candidate = %hit.code,
            score = hit.score,
            "matched"
        );
        return outcome(
            Some(hit.code),
            Resolution::Vocabulary,
            hit.score * 100.0,
            trace,
        );
    }
    trace.push(Stage::Semantic, None, None, false);

    // Stage 6: fuzzy similarity.
    if let Some(hit) = fuzzy_match(raw, def) {
        trace.push(Stage::Fuzzy, Some(hit.code.clone()), Some(hit.score), true);
        tracing::debug!(
            attribute_key = key,
            stage = %Stage::Fuzzy,
            candidate = %hit.code,
            score = hit.score,
            "matched"
        );
        return outcome(
            Some(hit.code),
            Resolution::Vocabulary,
            hit.score * 100.0,
            trace,
        );
    }
    trace.push(Stage::Fuzzy, None, None, false);

    // Stage 7: range detection, only for attributes that opted in.
    if let Some(rc) = &def.range_config {
        if rc.enable_range_detection {
            if let Some(range) = detect_range(raw, rc.range_type) {
                trace.push(Stage::Range, Some(range.clone()), None, true);
                tracing::debug!(
                    attribute_key = key,
                    stage = %Stage::Range,
                    candidate = %range,
                    "matched"
                );
                return outcome(
                    Some(range),
                    Resolution::Range,
                    defaults::RANGE_MATCH_CONFIDENCE,
                    trace,
                );
            }
            trace.push(Stage::Range, None, None, false);
        }
    }

    // Stage 8: raw fallback. The value passes through verbatim when it is
    // worth showing at all.
    if is_valid_raw_value(raw) {
        trace.push(Stage::Fallback, Some(raw.to_string()), None, true);
        return outcome(Some(raw.to_string()), Resolution::Raw, 0.0, trace);
    }
    trace.push(Stage::Fallback, None, None, false);
    outcome(None, Resolution::Absent, 0.0, trace)
}

/// Normalize a full extraction result against the schema.
///
/// Every schema key gets a record, including keys the model skipped. Keys
/// in the result that the schema does not define are ignored here (the
/// discovery path handles them separately).
pub fn process_batch_results(
    raw: &HashMap<String, RawAttributeValue>,
    schema: &SchemaMap,
) -> (HashMap<String, AttributeRecord>, BatchContext) {
    let ctx = infer_context(raw);
    let mut records = HashMap::with_capacity(schema.len());

    for (key, def) in schema {
        let record = match raw.get(key) {
            None => AttributeRecord::absent(None, 0.0),
            Some(rv) => {
                let out = process_extraction_result(key, rv.raw_value.as_deref(), def);
                AttributeRecord {
                    raw_value: rv.raw_value.clone(),
                    is_new_discovery: out.resolution == Resolution::Raw
                        && def.allowed_values.is_some(),
                    schema_value: out.value,
                    visual_confidence: rv.confidence,
                    mapping_confidence: out.confidence,
                    reasoning: rv.reasoning.clone(),
                }
            }
        };
        records.insert(key.clone(), record);
    }

    tracing::debug!(
        row_count = records.len(),
        fabric_family = ?ctx.fabric_family,
        garment_type = ?ctx.garment_type,
        "batch normalized"
    );
    (records, ctx)
}
