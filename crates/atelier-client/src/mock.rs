//! Mock extraction backend for deterministic testing.
//!
//! Scripted per-image responses, failure injection, configurable latency,
//! and a concurrency high-water mark for asserting on the dispatcher's
//! ceiling. Queue endpoints replay scripted status sequences so poller
//! behavior is testable without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use atelier_core::models::JobStatusResponse;
use atelier_core::{Error, Result};
use base64::Engine;

use crate::backend::{
    ExtractionBackend, ExtractionRequest, ExtractionResponse, QueueSubmitRequest,
};

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub detail: String,
    pub timestamp: std::time::Instant,
}

#[derive(Default)]
struct MockConfig {
    /// Scripted responses keyed by the request's base64 payload.
    responses: HashMap<String, ExtractionResponse>,
    default_response: ExtractionResponse,
    latency_ms: u64,
    failure_rate: f64,
    submit_job_id: Option<String>,
}

#[derive(Default)]
struct MockState {
    call_log: Vec<MockCall>,
    /// Scripted failure budgets per base64 payload.
    failures: HashMap<String, usize>,
    /// Scripted status sequences per job id, replayed in order. The last
    /// entry repeats once the sequence is exhausted.
    job_statuses: HashMap<String, Vec<JobStatusResponse>>,
    job_status_cursor: HashMap<String, usize>,
}

/// Mock extraction backend.
#[derive(Clone, Default)]
pub struct MockExtractionBackend {
    config: Arc<Mutex<MockConfig>>,
    state: Arc<Mutex<MockState>>,
    in_flight: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
}

fn b64(image: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(image)
}

impl MockExtractionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for a specific image payload.
    pub fn with_response_for_image(self, image: &[u8], response: ExtractionResponse) -> Self {
        self.lock_config().responses.insert(b64(image), response);
        self
    }

    /// Set the response returned when no scripted response matches.
    pub fn with_default_response(self, response: ExtractionResponse) -> Self {
        self.lock_config().default_response = response;
        self
    }

    /// Fail the next `count` extract calls for a specific image payload.
    pub fn with_failures_for_image(self, image: &[u8], count: usize) -> Self {
        self.lock_state().failures.insert(b64(image), count);
        self
    }

    /// Fail extract calls randomly at this rate (0.0-1.0).
    pub fn with_failure_rate(self, rate: f64) -> Self {
        self.lock_config().failure_rate = rate;
        self
    }

    /// Sleep this long inside every extract call.
    pub fn with_latency_ms(self, latency_ms: u64) -> Self {
        self.lock_config().latency_ms = latency_ms;
        self
    }

    /// Job id returned by `submit_job`.
    pub fn with_submit_job_id(self, job_id: impl Into<String>) -> Self {
        self.lock_config().submit_job_id = Some(job_id.into());
        self
    }

    /// Script the status sequence replayed for a job id.
    pub fn with_job_statuses(self, job_id: impl Into<String>, statuses: Vec<JobStatusResponse>) -> Self {
        self.lock_state().job_statuses.insert(job_id.into(), statuses);
        self
    }

    /// Highest number of concurrently in-flight extract calls observed.
    pub fn max_concurrent_calls(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// All recorded calls, in order.
    pub fn call_log(&self) -> Vec<MockCall> {
        self.lock_state().call_log.clone()
    }

    /// Number of extract calls recorded.
    pub fn extract_call_count(&self) -> usize {
        self.lock_state()
            .call_log
            .iter()
            .filter(|c| c.operation == "extract")
            .count()
    }

    fn lock_config(&self) -> std::sync::MutexGuard<'_, MockConfig> {
        self.config.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log(&self, operation: &str, detail: impl Into<String>) {
        self.lock_state().call_log.push(MockCall {
            operation: operation.to_string(),
            detail: detail.into(),
            timestamp: std::time::Instant::now(),
        });
    }
}

struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExtractionBackend for MockExtractionBackend {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResponse> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard {
            counter: Arc::clone(&self.in_flight),
        };

        self.log("extract", request.image_base64.clone());

        let (latency_ms, failure_rate) = {
            let config = self.lock_config();
            (config.latency_ms, config.failure_rate)
        };
        if latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(latency_ms)).await;
        }

        {
            let mut state = self.lock_state();
            if let Some(remaining) = state.failures.get_mut(&request.image_base64) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(Error::Extraction("scripted failure".into()));
                }
            }
        }
        if failure_rate > 0.0 && rand::random::<f64>() < failure_rate {
            return Err(Error::Extraction("injected failure".into()));
        }

        let config = self.lock_config();
        Ok(config
            .responses
            .get(&request.image_base64)
            .unwrap_or(&config.default_response)
            .clone())
    }

    async fn submit_job(&self, request: QueueSubmitRequest) -> Result<String> {
        self.log("submit_job", request.request.image_base64.clone());
        Ok(self
            .lock_config()
            .submit_job_id
            .clone()
            .unwrap_or_else(|| "mock-job-1".to_string()))
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        self.log("job_status", job_id);
        let mut state = self.lock_state();
        let statuses = state
            .job_statuses
            .get(job_id)
            .cloned()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Job(format!("unknown job '{}'", job_id)))?;
        let cursor = state.job_status_cursor.entry(job_id.to_string()).or_insert(0);
        let index = (*cursor).min(statuses.len() - 1);
        *cursor += 1;
        Ok(statuses[index].clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> Option<&str> {
        Some("mock-vision")
    }
}
