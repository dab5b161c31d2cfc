//! # atelier-jobs
//!
//! Batch extraction orchestration and queue polling for atelier.
//!
//! This crate provides:
//! - A batch orchestrator with a concurrency-capped sliding window,
//!   cooperative cancellation, pause/resume, and explicit retry
//! - Immutable snapshot publication of the row collection
//! - A broadcast event bus for row and batch progress
//! - A queue poller for the remote extraction queue
//! - Explicit discovery tracking with promotion thresholds
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use atelier_client::{BlockingCompressor, HttpExtractionBackend};
//! use atelier_jobs::{BatchOrchestrator, OrchestratorConfig};
//!
//! let backend = Arc::new(HttpExtractionBackend::from_env());
//! let compressor = Arc::new(BlockingCompressor::new());
//! let orchestrator =
//!     BatchOrchestrator::new(backend, compressor, OrchestratorConfig::from_env());
//!
//! let id = orchestrator.add_image("tee.jpg", image_bytes).await;
//! let stats = orchestrator.extract_all_pending(&schema).await;
//! ```

pub mod discovery;
pub mod orchestrator;
pub mod poller;

// Re-export core types
pub use atelier_core::*;

// Re-export the jobs surface
pub use discovery::{DiscoveryPolicy, DiscoveryTracker};
pub use orchestrator::{BatchOrchestrator, ExtractionEvent, OrchestratorConfig};
pub use poller::{PollAbortToken, QueuePoller};
