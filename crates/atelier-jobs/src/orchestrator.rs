//! Batch extraction orchestration.
//!
//! The orchestrator owns the in-memory row collection and publishes it as
//! an immutable snapshot: readers hold an `Arc<Vec<ImageRow>>` and every
//! mutation swaps in a fresh vector. Rows are never mutated in place after
//! publication.
//!
//! Dispatch is a sliding window: up to `concurrency` extraction calls are
//! in flight at once, and a finished call immediately frees a slot for the
//! next pending row. Cancellation is cooperative: the abort flag is
//! consulted before starting a task and again before writing a terminal
//! row status, so a cancelled batch never finalizes a row as Done after
//! the abort. Per-row failures are recorded on the row and reported over
//! the event bus; they never fail the batch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::Engine;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use atelier_client::{ExtractionBackend, ExtractionRequest, ImageCompressor};
use atelier_core::models::{ExtractionStats, ImageRow, RowStatus, SchemaMap};
use atelier_core::store::DataService;
use atelier_core::{defaults, Error, Result};
use atelier_match::process_batch_results;

use crate::discovery::{DiscoveryPolicy, DiscoveryTracker};

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum concurrent in-flight extraction calls.
    pub concurrency: usize,
    /// Automatic retry cap. Rows failing this often leave the default
    /// pending selection.
    pub max_retries: u32,
    /// Ask the backend to report attributes outside the schema.
    pub discovery_mode: bool,
    /// Category hint forwarded with every request.
    pub category_name: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::EXTRACT_CONCURRENCY,
            max_retries: defaults::MAX_EXTRACTION_RETRIES,
            discovery_mode: false,
            category_name: None,
        }
    }
}

impl OrchestratorConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ATELIER_EXTRACT_CONCURRENCY` | `3` | Concurrent extraction calls |
    /// | `ATELIER_MAX_RETRIES` | `3` | Automatic retry cap |
    /// | `ATELIER_DISCOVERY_MODE` | `false` | Report out-of-schema attributes |
    pub fn from_env() -> Self {
        let concurrency = std::env::var(defaults::ENV_EXTRACT_CONCURRENCY)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::EXTRACT_CONCURRENCY)
            .max(1);

        let max_retries = std::env::var(defaults::ENV_MAX_EXTRACTION_RETRIES)
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults::MAX_EXTRACTION_RETRIES);

        let discovery_mode = std::env::var(defaults::ENV_DISCOVERY_MODE)
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            concurrency,
            max_retries,
            discovery_mode,
            category_name: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_discovery_mode(mut self, discovery_mode: bool) -> Self {
        self.discovery_mode = discovery_mode;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_name = Some(category.into());
        self
    }
}

/// Event emitted by the orchestrator.
#[derive(Debug, Clone)]
pub enum ExtractionEvent {
    /// A row's extraction call started.
    RowStarted { row_id: Uuid },
    /// A row finished successfully.
    RowCompleted { row_id: Uuid, tokens_used: u64 },
    /// A row failed; the error is recorded on the row.
    RowFailed { row_id: Uuid, error: String },
    /// Batch progress after each settled row.
    BatchProgress {
        completed: usize,
        total: usize,
        percent: u8,
    },
    /// The batch finished (all rows settled, or dispatch stopped by abort).
    BatchFinished {
        stats: ExtractionStats,
        cancelled: bool,
    },
}

/// How one dispatched row settled. Internal bookkeeping for the window.
enum RowOutcome {
    Done,
    Failed,
    Skipped,
}

/// Orchestrates batch extraction over a shared row collection.
pub struct BatchOrchestrator {
    backend: Arc<dyn ExtractionBackend>,
    compressor: Arc<dyn ImageCompressor>,
    store: Option<Arc<dyn DataService>>,
    config: OrchestratorConfig,
    rows: RwLock<Arc<Vec<ImageRow>>>,
    discovery: std::sync::Mutex<DiscoveryTracker>,
    paused: AtomicBool,
    aborted: AtomicBool,
    event_tx: broadcast::Sender<ExtractionEvent>,
}

impl BatchOrchestrator {
    pub fn new(
        backend: Arc<dyn ExtractionBackend>,
        compressor: Arc<dyn ImageCompressor>,
        config: OrchestratorConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            backend,
            compressor,
            store: None,
            config,
            rows: RwLock::new(Arc::new(Vec::new())),
            discovery: std::sync::Mutex::new(DiscoveryTracker::new()),
            paused: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            event_tx,
        }
    }

    /// Persist row updates to a local cache.
    pub fn with_store(mut self, store: Arc<dyn DataService>) -> Self {
        self.store = Some(store);
        self
    }

    /// Get a receiver for orchestrator events.
    pub fn events(&self) -> broadcast::Receiver<ExtractionEvent> {
        self.event_tx.subscribe()
    }

    /// Current published snapshot of the row collection.
    pub async fn rows(&self) -> Arc<Vec<ImageRow>> {
        Arc::clone(&*self.rows.read().await)
    }

    /// Aggregate stats over the current snapshot.
    pub async fn stats(&self) -> ExtractionStats {
        ExtractionStats::from_rows(&self.rows().await)
    }

    /// Register an uploaded image as a Pending row. Returns the row id.
    pub async fn add_image(&self, file_name: impl Into<String>, image_data: Vec<u8>) -> Uuid {
        let row = ImageRow::new(file_name, image_data);
        let id = row.id;
        {
            let mut guard = self.rows.write().await;
            let mut next: Vec<ImageRow> = guard.iter().cloned().collect();
            next.push(row.clone());
            *guard = Arc::new(next);
        }
        self.persist(&row).await;
        id
    }

    /// Load previously cached rows into the collection, replacing it.
    pub async fn load_rows(&self, rows: Vec<ImageRow>) {
        let mut guard = self.rows.write().await;
        *guard = Arc::new(rows);
    }

    /// Signal cooperative cancellation of the running batch.
    pub fn cancel(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        tracing::info!("batch cancellation requested");
    }

    pub fn is_cancelled(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Stop dispatching new rows. In-flight calls keep running.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Discoveries meeting the policy thresholds, aggregated across all
    /// rows processed by this orchestrator.
    pub fn promotable_discoveries(
        &self,
        policy: &DiscoveryPolicy,
    ) -> Vec<atelier_core::models::DiscoveredAttribute> {
        self.lock_discovery().promotable(policy)
    }

    /// Extract one row and wait for it. Returns the updated row; per-row
    /// failure is recorded on the row, not returned as an error.
    pub async fn extract_one(&self, row_id: Uuid, schema: &SchemaMap) -> Result<ImageRow> {
        if self.get_row(row_id).await.is_none() {
            return Err(Error::Job(format!("unknown row '{}'", row_id)));
        }
        // An abort left over from a cancelled batch must not silently skip
        // this explicitly requested row.
        self.aborted.store(false, Ordering::SeqCst);
        self.run_row(row_id, schema).await;
        self.get_row(row_id)
            .await
            .ok_or_else(|| Error::Job(format!("row '{}' disappeared", row_id)))
    }

    /// Extract every auto-selectable row: Pending rows, plus Error rows
    /// with automatic retries remaining.
    ///
    /// Dispatches through a sliding window of at most `concurrency`
    /// in-flight calls. Returns the final stats; cancellation is not an
    /// error.
    pub async fn extract_all_pending(&self, schema: &SchemaMap) -> ExtractionStats {
        // A new batch starts with a fresh abort flag.
        self.aborted.store(false, Ordering::SeqCst);

        let mut queue: VecDeque<Uuid> = self
            .rows()
            .await
            .iter()
            .filter(|r| r.is_auto_selectable(self.config.max_retries))
            .map(|r| r.id)
            .collect();
        let total = queue.len();
        tracing::info!(
            row_count = total,
            concurrency = self.config.concurrency,
            "batch extraction started"
        );

        let mut in_flight = FuturesUnordered::new();
        let mut completed = 0usize;

        while completed < total {
            while in_flight.len() < self.config.concurrency
                && !self.is_paused()
                && !self.is_cancelled()
            {
                match queue.pop_front() {
                    Some(id) => in_flight.push(self.run_row(id, schema)),
                    None => break,
                }
            }

            if in_flight.is_empty() {
                if self.is_cancelled() || queue.is_empty() {
                    break;
                }
                // Paused with nothing in flight: wait for resume.
                tokio::time::sleep(std::time::Duration::from_millis(25)).await;
                continue;
            }

            if in_flight.next().await.is_some() {
                completed += 1;
                let percent = ((completed * 100) / total) as u8;
                let _ = self.event_tx.send(ExtractionEvent::BatchProgress {
                    completed,
                    total,
                    percent,
                });
            }
        }

        let stats = self.stats().await;
        let cancelled = self.is_cancelled();
        tracing::info!(
            done = stats.done,
            failed = stats.failed,
            tokens_used = stats.tokens_used,
            cancelled,
            "batch extraction finished"
        );
        let _ = self.event_tx.send(ExtractionEvent::BatchFinished {
            stats: stats.clone(),
            cancelled,
        });
        stats
    }

    /// Re-submit every failed row, ignoring the automatic retry cap.
    pub async fn retry_failed(&self, schema: &SchemaMap) -> ExtractionStats {
        let failed: Vec<ImageRow> = self
            .rows()
            .await
            .iter()
            .filter(|r| r.status == RowStatus::Error)
            .cloned()
            .collect();
        for row in failed {
            let mut reset = row.with_status(RowStatus::Pending);
            reset.error = None;
            self.publish_row(reset).await;
        }
        self.extract_all_pending(schema).await
    }

    /// Drop all Done rows from the collection (and the cache).
    pub async fn clear_completed(&self) {
        let removed: Vec<Uuid> = {
            let mut guard = self.rows.write().await;
            let (keep, dropped): (Vec<ImageRow>, Vec<ImageRow>) = guard
                .iter()
                .cloned()
                .partition(|r| r.status != RowStatus::Done);
            *guard = Arc::new(keep);
            dropped.into_iter().map(|r| r.id).collect()
        };
        if let Some(store) = &self.store {
            for id in removed {
                if let Err(e) = store.delete_row(id).await {
                    tracing::warn!(row_id = %id, error = %e, "failed to delete cached row");
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    async fn get_row(&self, id: Uuid) -> Option<ImageRow> {
        self.rows.read().await.iter().find(|r| r.id == id).cloned()
    }

    /// Replace one row's slot and republish the collection.
    async fn publish_row(&self, updated: ImageRow) {
        {
            let mut guard = self.rows.write().await;
            let mut next: Vec<ImageRow> = guard.iter().cloned().collect();
            if let Some(slot) = next.iter_mut().find(|r| r.id == updated.id) {
                *slot = updated.clone();
            }
            *guard = Arc::new(next);
        }
        self.persist(&updated).await;
    }

    async fn persist(&self, row: &ImageRow) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_row(row).await {
                tracing::warn!(row_id = %row.id, error = %e, "failed to persist row");
            }
        }
    }

    fn lock_discovery(&self) -> std::sync::MutexGuard<'_, DiscoveryTracker> {
        self.discovery.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one row end to end. All failures are absorbed into the row.
    async fn run_row(&self, id: Uuid, schema: &SchemaMap) -> RowOutcome {
        // Abort consulted before the task starts.
        if self.is_cancelled() {
            return RowOutcome::Skipped;
        }
        let Some(row) = self.get_row(id).await else {
            return RowOutcome::Skipped;
        };

        self.publish_row(row.clone().with_status(RowStatus::Extracting))
            .await;
        let _ = self
            .event_tx
            .send(ExtractionEvent::RowStarted { row_id: id });

        match self.call_backend(&row, schema).await {
            Ok(response) => {
                // Abort consulted again before the terminal write: a
                // cancelled batch never finalizes a row as Done. The row
                // returns to Pending with its work discarded.
                if self.is_cancelled() {
                    self.publish_row(row.with_status(RowStatus::Pending)).await;
                    return RowOutcome::Skipped;
                }

                let (records, _ctx) = process_batch_results(&response.attributes, schema);
                {
                    let mut tracker = self.lock_discovery();
                    for d in &response.discoveries {
                        tracker.record(d);
                    }
                }

                let mut done = row.with_status(RowStatus::Done);
                done.attributes = records;
                done.discoveries = response.discoveries;
                done.tokens_used = response.tokens_used;
                done.model_used = response.model_used;
                done.error = None;
                let tokens_used = done.tokens_used;
                self.publish_row(done).await;

                let _ = self.event_tx.send(ExtractionEvent::RowCompleted {
                    row_id: id,
                    tokens_used,
                });
                RowOutcome::Done
            }
            Err(e) => {
                if self.is_cancelled() || e.is_cancelled() {
                    self.publish_row(row.with_status(RowStatus::Pending)).await;
                    return RowOutcome::Skipped;
                }

                let message = e.to_string();
                tracing::warn!(row_id = %id, error = %message, "row extraction failed");
                self.publish_row(row.with_error(&message)).await;
                let _ = self.event_tx.send(ExtractionEvent::RowFailed {
                    row_id: id,
                    error: message,
                });
                RowOutcome::Failed
            }
        }
    }

    /// Compress, encode, and call the extraction backend for one row.
    async fn call_backend(
        &self,
        row: &ImageRow,
        schema: &SchemaMap,
    ) -> Result<atelier_client::ExtractionResponse> {
        let compressed = self.compressor.compress(&row.image_data).await?;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(&compressed);
        self.backend
            .extract(ExtractionRequest {
                image_base64,
                schema: schema.clone(),
                category_name: self.config.category_name.clone(),
                discovery_mode: self.config.discovery_mode,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.concurrency, defaults::EXTRACT_CONCURRENCY);
        assert_eq!(config.max_retries, defaults::MAX_EXTRACTION_RETRIES);
        assert!(!config.discovery_mode);
    }

    #[test]
    fn test_config_builders_floor_concurrency() {
        let config = OrchestratorConfig::default().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_config_category() {
        let config = OrchestratorConfig::default().with_category("T-Shirts");
        assert_eq!(config.category_name.as_deref(), Some("T-Shirts"));
    }
}
