//! Structured logging schema and field name constants for atelier.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (batch start/stop), operation completions |
//! | DEBUG | Decision points: which match stage fired, config choices |
//! | TRACE | Per-candidate scoring, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "match", "client", "jobs", "store"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "processor", "orchestrator", "poller", "compressor"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "extract_one", "process_batch", "poll_status"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Image row UUID being operated on.
pub const ROW_ID: &str = "row_id";

/// Remote queue job identifier.
pub const JOB_ID: &str = "job_id";

/// Attribute key being matched ("neck_type", "fab_composition").
pub const ATTRIBUTE_KEY: &str = "attribute_key";

/// Category name sent with the extraction request.
pub const CATEGORY: &str = "category";

// ─── Matching fields ───────────────────────────────────────────────────────

/// Pipeline stage that produced a decision.
/// Values: "null_like", "exact", "safeguard", "semantic", "fuzzy", "range",
/// "fallback"
pub const STAGE: &str = "stage";

/// Candidate vocabulary code under consideration.
pub const CANDIDATE: &str = "candidate";

/// Normalized score for the candidate (0.0-1.0).
pub const SCORE: &str = "score";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows in the batch under dispatch.
pub const ROW_COUNT: &str = "row_count";

/// Tokens consumed by a backend call.
pub const TOKENS_USED: &str = "tokens_used";

/// Aggregate batch progress (0-100).
pub const PROGRESS_PERCENT: &str = "progress_percent";

/// Remote queue position while a job is pending.
pub const QUEUE_POSITION: &str = "queue_position";
