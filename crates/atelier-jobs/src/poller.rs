//! Remote queue polling.
//!
//! After a job is submitted to the extraction queue, its status is polled
//! on a fixed interval until it reaches a terminal state, the deadline
//! elapses, or the caller aborts. Progress is derived from the reported
//! queue position: pending jobs climb toward a low ceiling as they move up
//! the queue, processing jobs report a fixed midpoint, and the caller
//! fills to 100 on completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use atelier_client::{ExtractionBackend, ExtractionResponse, QueueSubmitRequest};
use atelier_core::models::JobStatus;
use atelier_core::{defaults, Error, Result};

/// Cloneable handle for aborting an in-progress poll.
#[derive(Clone, Default)]
pub struct PollAbortToken {
    aborted: Arc<AtomicBool>,
}

impl PollAbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Polls the remote queue for job completion.
pub struct QueuePoller {
    backend: Arc<dyn ExtractionBackend>,
    interval_ms: u64,
    timeout_ms: u64,
    abort: PollAbortToken,
}

impl QueuePoller {
    pub fn new(backend: Arc<dyn ExtractionBackend>) -> Self {
        Self {
            backend,
            interval_ms: defaults::QUEUE_POLL_INTERVAL_MS,
            timeout_ms: defaults::QUEUE_POLL_TIMEOUT_MS,
            abort: PollAbortToken::new(),
        }
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// A handle that aborts this poller's polls from another task.
    pub fn abort_token(&self) -> PollAbortToken {
        self.abort.clone()
    }

    /// Submit a job to the remote queue.
    pub async fn submit(&self, request: QueueSubmitRequest) -> Result<String> {
        let job_id = self.backend.submit_job(request).await?;
        tracing::info!(job_id = %job_id, "job submitted to queue");
        Ok(job_id)
    }

    /// Poll until the job completes, fails, times out, or is aborted.
    ///
    /// `on_progress` receives a 0-100 percent derived from the queue
    /// position; it never reaches 100 here, the caller owns completion.
    pub async fn poll_until_complete(
        &self,
        job_id: &str,
        mut on_progress: impl FnMut(u8),
    ) -> Result<ExtractionResponse> {
        let started = tokio::time::Instant::now();
        let interval = std::time::Duration::from_millis(self.interval_ms);

        loop {
            if self.abort.is_aborted() {
                tracing::info!(job_id = %job_id, "poll aborted");
                return Err(Error::Cancelled(format!("poll of job '{}' aborted", job_id)));
            }

            let status = self.backend.job_status(job_id).await?;
            match status.status {
                JobStatus::Pending => {
                    let percent = pending_progress(status.queue_position);
                    tracing::debug!(
                        job_id = %job_id,
                        queue_position = status.queue_position,
                        progress_percent = percent,
                        "job pending"
                    );
                    on_progress(percent);
                }
                JobStatus::Processing => {
                    on_progress(defaults::QUEUE_PROCESSING_PROGRESS);
                }
                JobStatus::Completed => {
                    let value = status.result.ok_or_else(|| {
                        Error::Job(format!("job '{}' completed without a result", job_id))
                    })?;
                    let response: ExtractionResponse = serde_json::from_value(value)?;
                    return Ok(response);
                }
                JobStatus::Failed => {
                    let message = status
                        .error
                        .unwrap_or_else(|| "job failed without an error message".to_string());
                    return Err(Error::Extraction(message));
                }
            }

            if started.elapsed().as_millis() as u64 >= self.timeout_ms {
                return Err(Error::Timeout(self.timeout_ms));
            }
            tokio::time::sleep(interval).await;
        }
    }
}

/// Progress for a job still waiting in the queue: climbs toward the
/// pending cap as the position shrinks.
fn pending_progress(queue_position: u32) -> u8 {
    let cap = defaults::QUEUE_PENDING_PROGRESS_CAP as u32;
    (cap / (queue_position + 1)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_progress_monotone_in_position() {
        assert_eq!(pending_progress(0), defaults::QUEUE_PENDING_PROGRESS_CAP);
        let mut last = u8::MAX;
        for position in 0..10 {
            let p = pending_progress(position);
            assert!(p <= last, "progress must not rise with position");
            assert!(p <= defaults::QUEUE_PENDING_PROGRESS_CAP);
            last = p;
        }
    }

    #[test]
    fn test_pending_progress_below_processing() {
        for position in 0..100 {
            assert!(pending_progress(position) < defaults::QUEUE_PROCESSING_PROGRESS);
        }
    }

    #[test]
    fn test_abort_token_shared() {
        let token = PollAbortToken::new();
        let clone = token.clone();
        assert!(!clone.is_aborted());
        token.abort();
        assert!(clone.is_aborted());
    }
}
