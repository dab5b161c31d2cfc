//! Centralized default constants for the atelier system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// BATCH EXTRACTION
// =============================================================================

/// Default number of concurrent in-flight extraction calls per batch.
///
/// The remote vision backend is rate limited; three in-flight requests keeps
/// throughput reasonable without tripping the limiter.
pub const EXTRACT_CONCURRENCY: usize = 3;

/// Maximum automatic retry count for a failed row. A row that has failed
/// this many times is excluded from the default pending selection but can
/// still be re-submitted explicitly via `retry_failed`.
pub const MAX_EXTRACTION_RETRIES: u32 = 3;

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Per-request timeout for extraction calls in seconds.
pub const EXTRACT_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// QUEUE POLLING
// =============================================================================

/// Interval between job-status polls in milliseconds.
pub const QUEUE_POLL_INTERVAL_MS: u64 = 2_000;

/// Hard deadline for a queued job to reach a terminal state.
pub const QUEUE_POLL_TIMEOUT_MS: u64 = 120_000;

/// Progress ceiling while a job is still waiting in the remote queue.
/// Pending progress is scaled by queue position but never exceeds this.
pub const QUEUE_PENDING_PROGRESS_CAP: u8 = 30;

/// Fixed progress reported while the remote job is processing. The caller
/// fills to 100 on completion.
pub const QUEUE_PROCESSING_PROGRESS: u8 = 50;

// =============================================================================
// MATCHING THRESHOLDS
// =============================================================================

/// Minimum token-match fraction for the semantic/synonym stage to accept a
/// candidate. Stricter than the plain fuzzy bar: token overlap is a weaker
/// signal per unit of score than edit distance.
pub const SEMANTIC_MATCH_THRESHOLD: f64 = 0.90;

/// Minimum normalized string similarity for the fuzzy stage to accept.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.70;

/// Mapping confidence reported for an exact vocabulary hit (0-100 scale).
pub const EXACT_MATCH_CONFIDENCE: f64 = 100.0;

/// Mapping confidence reported for a safeguard-rule hit.
pub const RULE_MATCH_CONFIDENCE: f64 = 95.0;

/// Mapping confidence reported when range detection produced the value.
pub const RANGE_MATCH_CONFIDENCE: f64 = 90.0;

// =============================================================================
// DISCOVERY PROMOTION
// =============================================================================

/// Minimum times a discovered attribute must be seen across a batch before
/// it is promotable to the schema.
pub const DISCOVERY_MIN_FREQUENCY: u32 = 2;

/// Minimum confidence (0-100) for a discovered attribute to be promotable.
pub const DISCOVERY_MIN_CONFIDENCE: f64 = 75.0;

// =============================================================================
// SERVICE URLS AND ENVIRONMENT VARIABLES
// =============================================================================

/// Default base URL of the extraction service.
pub const EXTRACT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the extraction service base URL.
pub const ENV_EXTRACT_BASE_URL: &str = "ATELIER_EXTRACT_URL";

/// Environment variable carrying the extraction service API key.
pub const ENV_EXTRACT_API_KEY: &str = "ATELIER_EXTRACT_API_KEY";

/// Environment variable overriding the per-request timeout in seconds.
pub const ENV_EXTRACT_TIMEOUT_SECS: &str = "ATELIER_EXTRACT_TIMEOUT_SECS";

/// Environment variable overriding the batch concurrency ceiling.
pub const ENV_EXTRACT_CONCURRENCY: &str = "ATELIER_EXTRACT_CONCURRENCY";

/// Environment variable overriding the automatic retry cap.
pub const ENV_MAX_EXTRACTION_RETRIES: &str = "ATELIER_MAX_RETRIES";

/// Environment variable toggling attribute discovery mode ("1"/"true").
pub const ENV_DISCOVERY_MODE: &str = "ATELIER_DISCOVERY_MODE";

// =============================================================================
// IMAGE COMPRESSION
// =============================================================================

/// Target maximum encoded image size in bytes (1 MB) before upload.
pub const COMPRESS_TARGET_BYTES: usize = 1024 * 1024;

/// Inputs already at or below this size skip the encoder entirely (256 KB).
pub const COMPRESS_SKIP_BYTES: usize = 256 * 1024;
