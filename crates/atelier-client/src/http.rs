//! HTTP extraction backend over reqwest.

use async_trait::async_trait;
use atelier_core::models::JobStatusResponse;
use atelier_core::{defaults, Error, Result};
use serde::Deserialize;

use crate::backend::{
    ExtractionBackend, ExtractionRequest, ExtractionResponse, QueueSubmitRequest,
};

/// HTTP client for the extraction service.
pub struct HttpExtractionBackend {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpExtractionBackend {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            api_key: None,
            client: reqwest::Client::new(),
            timeout_secs: defaults::EXTRACT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Create from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_EXTRACT_BASE_URL)
            .unwrap_or_else(|_| defaults::EXTRACT_BASE_URL.to_string());
        let mut backend = Self::new(base_url);
        if let Ok(key) = std::env::var(defaults::ENV_EXTRACT_API_KEY) {
            if !key.is_empty() {
                backend.api_key = Some(key);
            }
        }
        if let Some(secs) = std::env::var(defaults::ENV_EXTRACT_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse().ok())
        {
            backend.timeout_secs = secs;
        }
        backend
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, &url)
            .timeout(std::time::Duration::from_secs(self.timeout_secs));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Extraction(format!(
            "Extraction API returned {}: {}",
            status, body
        )))
    }
}

/// Submit endpoint response. Only the job id matters to callers.
#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[async_trait]
impl ExtractionBackend for HttpExtractionBackend {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResponse> {
        let started = std::time::Instant::now();
        let response = self
            .request(reqwest::Method::POST, "/extract")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout_secs * 1000)
                } else {
                    Error::Request(format!("Extraction request failed: {}", e))
                }
            })?;
        let response = Self::check_status(response).await?;

        let result: ExtractionResponse = response.json().await.map_err(|e| {
            Error::Serialization(format!("Failed to parse extraction response: {}", e))
        })?;
        tracing::debug!(
            tokens_used = result.tokens_used,
            duration_ms = started.elapsed().as_millis() as u64,
            "extraction call complete"
        );
        Ok(result)
    }

    async fn submit_job(&self, request: QueueSubmitRequest) -> Result<String> {
        let response = self
            .request(reqwest::Method::POST, "/queue/submit")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Queue submit failed: {}", e)))?;
        let response = Self::check_status(response).await?;

        let result: SubmitResponse = response.json().await.map_err(|e| {
            Error::Serialization(format!("Failed to parse submit response: {}", e))
        })?;
        tracing::debug!(job_id = %result.job_id, "job submitted");
        Ok(result.job_id)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let response = self
            .request(reqwest::Method::GET, &format!("/queue/status/{}", job_id))
            .send()
            .await
            .map_err(|e| Error::Request(format!("Status poll failed: {}", e)))?;
        let response = Self::check_status(response).await?;

        response.json().await.map_err(|e| {
            Error::Serialization(format!("Failed to parse status response: {}", e))
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
