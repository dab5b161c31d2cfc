//! Extraction backend trait and wire types.

use std::collections::HashMap;

use async_trait::async_trait;
use atelier_core::models::{
    DiscoveredAttribute, JobStatusResponse, RawAttributeValue, SchemaMap,
};
use atelier_core::Result;
use serde::{Deserialize, Serialize};

/// Backend for extracting garment attributes from product images.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Run one direct extraction call and wait for the result.
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResponse>;

    /// Submit an extraction job to the remote queue. Returns the job id.
    async fn submit_job(&self, request: QueueSubmitRequest) -> Result<String>;

    /// Fetch the current status of a queued job.
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse>;

    /// Check if the extraction service is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used, if the backend knows it.
    fn model_name(&self) -> Option<&str> {
        None
    }
}

/// One direct extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Base64-encoded image payload (no data-URL prefix).
    pub image_base64: String,
    /// The attribute schema the model must fill.
    pub schema: SchemaMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Ask the model to report attributes outside the schema.
    #[serde(default)]
    pub discovery_mode: bool,
}

/// A queued extraction job. Extends the direct call with routing hints the
/// queue scheduler uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSubmitRequest {
    #[serde(flatten)]
    pub request: ExtractionRequest,
    #[serde(default)]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_department: Option<String>,
    /// Bypass any server-side result cache.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Raw extraction result as returned by the service, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub attributes: HashMap<String, RawAttributeValue>,
    #[serde(default)]
    pub discoveries: Vec<DiscoveredAttribute>,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default)]
    pub processing_time_ms: u64,
    /// Overall extraction confidence reported by the model (0-100).
    #[serde(default)]
    pub confidence: f64,
}
