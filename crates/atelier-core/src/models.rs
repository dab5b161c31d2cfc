//! Core data models for atelier.
//!
//! Schema definitions (the controlled vocabulary), per-image extraction
//! records, and the job/status types observed from the remote queue.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// SCHEMA
// =============================================================================

/// Rendering/input type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Text,
    Select,
    Number,
}

/// One entry of an attribute's controlled vocabulary.
///
/// `short_form` is the canonical code stored on records ("RN", "FS");
/// `full_form` is the human-readable expansion ("Round Neck", "Full Sleeve").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedValue {
    pub short_form: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_form: Option<String>,
}

impl AllowedValue {
    pub fn new(short_form: impl Into<String>, full_form: impl Into<String>) -> Self {
        Self {
            short_form: short_form.into(),
            full_form: Some(full_form.into()),
        }
    }

    /// A vocabulary entry that is only a code, with no expansion.
    pub fn code_only(short_form: impl Into<String>) -> Self {
        Self {
            short_form: short_form.into(),
            full_form: None,
        }
    }
}

/// Kind of range an attribute's values describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeType {
    Size,
    Gsm,
    Numeric,
    Custom,
}

/// Secondary range-detection pass configuration. Only consulted when exact
/// and fuzzy matching have both failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeConfig {
    pub enable_range_detection: bool,
    pub range_type: RangeType,
}

impl RangeConfig {
    pub fn size() -> Self {
        Self {
            enable_range_detection: true,
            range_type: RangeType::Size,
        }
    }

    pub fn gsm() -> Self {
        Self {
            enable_range_detection: true,
            range_type: RangeType::Gsm,
        }
    }
}

/// Definition of one extractable attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Unique attribute key, e.g. "neck_type", "fab_composition".
    pub key: String,
    /// Display label.
    pub label: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    /// Controlled vocabulary. Absent for free-text attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<AllowedValue>>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_config: Option<RangeConfig>,
}

impl AttributeDefinition {
    /// Create a free-text attribute with no vocabulary.
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            attribute_type: AttributeType::Text,
            allowed_values: None,
            required: false,
            range_config: None,
        }
    }

    /// Create a select attribute with a controlled vocabulary.
    pub fn select(
        key: impl Into<String>,
        label: impl Into<String>,
        values: Vec<AllowedValue>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            attribute_type: AttributeType::Select,
            allowed_values: Some(values),
            required: false,
            range_config: None,
        }
    }

    pub fn with_range(mut self, range: RangeConfig) -> Self {
        self.range_config = Some(range);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Whether `code` appears as a short form in this attribute's vocabulary.
    pub fn has_code(&self, code: &str) -> bool {
        self.allowed_values
            .as_ref()
            .is_some_and(|vs| vs.iter().any(|v| v.short_form == code))
    }

    /// Validate the invariant that short forms are unique within one
    /// attribute's vocabulary.
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(Error::Schema("attribute key must not be empty".into()));
        }
        if let Some(values) = &self.allowed_values {
            let mut seen = std::collections::HashSet::new();
            for v in values {
                if !seen.insert(v.short_form.as_str()) {
                    return Err(Error::Schema(format!(
                        "duplicate short form '{}' in attribute '{}'",
                        v.short_form, self.key
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Schema keyed by attribute key.
pub type SchemaMap = HashMap<String, AttributeDefinition>;

/// Validate every definition in a schema map.
pub fn validate_schema(schema: &SchemaMap) -> Result<()> {
    for (key, def) in schema {
        if key != &def.key {
            return Err(Error::Schema(format!(
                "schema map key '{}' does not match definition key '{}'",
                key, def.key
            )));
        }
        def.validate()?;
    }
    Ok(())
}

// =============================================================================
// EXTRACTION RECORDS
// =============================================================================

/// Raw per-attribute output from the vision backend, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAttributeValue {
    #[serde(default)]
    pub raw_value: Option<String>,
    /// Visual confidence reported by the model (0-100).
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// One normalized attribute on one image.
///
/// `raw_value` is preserved verbatim for audit even when `schema_value`
/// differs or is null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub raw_value: Option<String>,
    /// Normalized value: a vocabulary short form, a detected range, or the
    /// raw value unchanged. None when the raw value was a non-answer.
    pub schema_value: Option<String>,
    /// Visual confidence from the model (0-100).
    pub visual_confidence: f64,
    /// Confidence of the raw-to-schema mapping (0-100).
    pub mapping_confidence: f64,
    /// True when the value did not resolve to the vocabulary and may be a
    /// candidate for schema extension.
    pub is_new_discovery: bool,
    pub reasoning: String,
}

impl AttributeRecord {
    /// Record for an attribute the model produced no usable answer for.
    pub fn absent(raw_value: Option<String>, visual_confidence: f64) -> Self {
        Self {
            raw_value,
            schema_value: None,
            visual_confidence,
            mapping_confidence: 0.0,
            is_new_discovery: false,
            reasoning: String::new(),
        }
    }
}

/// Attribute discovered by the model outside the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredAttribute {
    pub key: String,
    pub label: String,
    pub normalized_value: String,
    pub raw_value: String,
    /// Confidence 0-100.
    pub confidence: f64,
    /// How many rows in the batch produced this discovery.
    #[serde(default)]
    pub frequency: u32,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub possible_values: Vec<String>,
}

// =============================================================================
// IMAGE ROWS
// =============================================================================

/// Lifecycle status of one image row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Created on upload, not yet dispatched.
    Pending,
    /// Submitted to the remote queue, awaiting its turn.
    Queued,
    /// Remote job is running.
    Processing,
    /// Direct extraction call in flight.
    Extracting,
    /// Terminal: attributes populated.
    Done,
    /// Terminal: failure recorded on the row. May be retried.
    Error,
}

impl RowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RowStatus::Done | RowStatus::Error)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            RowStatus::Queued | RowStatus::Processing | RowStatus::Extracting
        )
    }
}

/// One uploaded image and its extraction state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRow {
    pub id: Uuid,
    /// Raw image bytes as uploaded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_data: Vec<u8>,
    pub original_file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub status: RowStatus,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeRecord>,
    #[serde(default)]
    pub discoveries: Vec<DiscoveredAttribute>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImageRow {
    /// Create a fresh Pending row for an uploaded image.
    pub fn new(file_name: impl Into<String>, image_data: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            image_data,
            original_file_name: file_name.into(),
            preview_url: None,
            status: RowStatus::Pending,
            attributes: HashMap::new(),
            discoveries: Vec::new(),
            retry_count: 0,
            error: None,
            tokens_used: 0,
            model_used: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this row is eligible for the default pending selection:
    /// Pending, or Error with remaining automatic retries.
    pub fn is_auto_selectable(&self, max_retries: u32) -> bool {
        match self.status {
            RowStatus::Pending => true,
            RowStatus::Error => self.retry_count < max_retries,
            _ => false,
        }
    }

    /// Transition to a new status, bumping `updated_at`.
    pub fn with_status(mut self, status: RowStatus) -> Self {
        self.status = status;
        self.updated_at = Utc::now();
        self
    }

    /// Record a per-row failure: terminal Error, message captured, retry
    /// count incremented.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.status = RowStatus::Error;
        self.error = Some(message.into());
        self.retry_count += 1;
        self.updated_at = Utc::now();
        self
    }
}

// =============================================================================
// QUEUE JOBS (remote service; client only observes via polling)
// =============================================================================

/// Remote job status as reported by the queue service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Response of the job-status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub queue_position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_wait_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// Aggregate view over a batch of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub done: usize,
    pub failed: usize,
    pub tokens_used: u64,
}

impl ExtractionStats {
    /// Compute aggregate stats from a row snapshot.
    pub fn from_rows(rows: &[ImageRow]) -> Self {
        let mut stats = Self {
            total: rows.len(),
            ..Default::default()
        };
        for row in rows {
            match row.status {
                RowStatus::Pending => stats.pending += 1,
                RowStatus::Done => stats.done += 1,
                RowStatus::Error => stats.failed += 1,
                _ => stats.in_flight += 1,
            }
            stats.tokens_used += row.tokens_used;
        }
        stats
    }

    /// Aggregate progress: (completed + failed) / total, as 0-100.
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (((self.done + self.failed) * 100) / self.total) as u8
    }
}
