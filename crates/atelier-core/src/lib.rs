//! # atelier-core
//!
//! Core types, traits, and defaults for the atelier library.
//!
//! This crate provides the foundational data structures (attribute schema,
//! extraction records, image rows, queue job statuses), the shared error
//! type, centralized default constants, the structured-logging field schema,
//! and the pluggable local-cache trait that the other atelier crates depend
//! on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use store::{DataService, MemoryStore};
