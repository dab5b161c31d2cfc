//! # atelier-client
//!
//! Extraction service client for atelier.
//!
//! This crate provides:
//! - Pluggable extraction backend trait (direct calls + queued jobs)
//! - HTTP implementation over reqwest with env-driven configuration
//! - Image compression seam with blocking-pool delegation
//! - Mock backend for deterministic tests (feature `mock`)
//!
//! # Feature Flags
//!
//! - `mock`: Enable [`mock::MockExtractionBackend`]
//!
//! # Example
//!
//! ```rust,no_run
//! use atelier_client::{ExtractionBackend, HttpExtractionBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = HttpExtractionBackend::from_env();
//!     let healthy = backend.health_check().await.unwrap();
//!     assert!(healthy);
//! }
//! ```

pub mod backend;
pub mod compress;
pub mod http;

#[cfg(feature = "mock")]
pub mod mock;

// Re-export core types
pub use atelier_core::*;

// Re-export the client surface
pub use backend::{
    ExtractionBackend, ExtractionRequest, ExtractionResponse, QueueSubmitRequest,
};
pub use compress::{BlockingCompressor, EncodeFn, ImageCompressor};
pub use http::HttpExtractionBackend;

#[cfg(feature = "mock")]
pub use mock::MockExtractionBackend;
