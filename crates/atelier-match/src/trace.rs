//! Structured decision traces.
//!
//! Every normalization run returns an ordered record of which stages were
//! consulted, which candidates were scored, and which step was accepted.
//! The trace feeds both debug logging and tests; control flow never depends
//! on it.

use serde::{Deserialize, Serialize};

/// Pipeline stage identifiers, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    NullLike,
    Exact,
    Safeguard,
    Filler,
    Semantic,
    Fuzzy,
    Range,
    Fallback,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::NullLike => "null_like",
            Stage::Exact => "exact",
            Stage::Safeguard => "safeguard",
            Stage::Filler => "filler",
            Stage::Semantic => "semantic",
            Stage::Fuzzy => "fuzzy",
            Stage::Range => "range",
            Stage::Fallback => "fallback",
        };
        write!(f, "{s}")
    }
}

/// One recorded decision point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub stage: Stage,
    /// Candidate code or produced value, when one was under consideration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,
    /// Normalized score (0.0-1.0), when the stage scores candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub accepted: bool,
}

/// Ordered list of decision points for one attribute value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTrace {
    pub steps: Vec<TraceStep>,
}

impl DecisionTrace {
    pub fn push(&mut self, stage: Stage, candidate: Option<String>, score: Option<f64>, accepted: bool) {
        self.steps.push(TraceStep {
            stage,
            candidate,
            score,
            accepted,
        });
    }

    /// The stage of the accepted step, if any step was accepted.
    pub fn accepted_stage(&self) -> Option<Stage> {
        self.steps.iter().find(|s| s.accepted).map(|s| s.stage)
    }
}

/// How the final value was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Resolved to a vocabulary short form.
    Vocabulary,
    /// Reduced to a size/GSM/numeric range string.
    Range,
    /// Raw value passed through unchanged.
    Raw,
    /// No usable value (non-answer, or a safeguard blocked the match).
    Absent,
}

/// Outcome of normalizing one raw value against one attribute definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// The normalized value. For `Resolution::Raw` this equals the input;
    /// for `Resolution::Absent` it is None.
    pub value: Option<String>,
    pub resolution: Resolution,
    /// Mapping confidence on the 0-100 scale.
    pub confidence: f64,
    pub trace: DecisionTrace,
}

impl MatchOutcome {
    pub fn matched(&self) -> bool {
        matches!(self.resolution, Resolution::Vocabulary | Resolution::Range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_stage() {
        let mut trace = DecisionTrace::default();
        trace.push(Stage::Exact, None, None, false);
        trace.push(Stage::Semantic, Some("RN".into()), Some(0.95), true);
        assert_eq!(trace.accepted_stage(), Some(Stage::Semantic));
    }

    #[test]
    fn test_accepted_stage_none() {
        let mut trace = DecisionTrace::default();
        trace.push(Stage::Exact, None, None, false);
        assert_eq!(trace.accepted_stage(), None);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::NullLike.to_string(), "null_like");
        assert_eq!(Stage::Safeguard.to_string(), "safeguard");
        assert_eq!(Stage::Fallback.to_string(), "fallback");
    }

    #[test]
    fn test_trace_serializes() {
        let mut trace = DecisionTrace::default();
        trace.push(Stage::Fuzzy, Some("FS".into()), Some(0.81), true);
        let json = serde_json::to_string(&trace).unwrap();
        assert!(json.contains("\"stage\":\"fuzzy\""));
        assert!(json.contains("\"accepted\":true"));
    }

    #[test]
    fn test_outcome_matched() {
        let outcome = MatchOutcome {
            value: Some("RN".into()),
            resolution: Resolution::Vocabulary,
            confidence: 100.0,
            trace: DecisionTrace::default(),
        };
        assert!(outcome.matched());

        let raw = MatchOutcome {
            value: Some("herringbone".into()),
            resolution: Resolution::Raw,
            confidence: 0.0,
            trace: DecisionTrace::default(),
        };
        assert!(!raw.matched());
    }
}
