//! Pluggable local cache interface.
//!
//! The browser original keeps rows and the schema blob in IndexedDB; here
//! the cache is a trait so the orchestrator can run against anything. The
//! cache is a convenience, not a database engine: no querying, no
//! transactions, keyed access only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ImageRow, SchemaMap};

/// Keyed object store of rows plus a singleton schema blob.
#[async_trait]
pub trait DataService: Send + Sync {
    /// All cached rows, in no particular order.
    async fn get_all_rows(&self) -> Result<Vec<ImageRow>>;

    /// Insert or replace one row by id.
    async fn save_row(&self, row: &ImageRow) -> Result<()>;

    /// Insert or replace many rows.
    async fn save_rows(&self, rows: &[ImageRow]) -> Result<()> {
        for row in rows {
            self.save_row(row).await?;
        }
        Ok(())
    }

    /// Remove one row. Removing a missing row is not an error.
    async fn delete_row(&self, id: Uuid) -> Result<()>;

    /// Remove all rows.
    async fn clear_rows(&self) -> Result<()>;

    /// Replace the singleton schema blob.
    async fn save_schema(&self, schema: &SchemaMap) -> Result<()>;

    /// The cached schema, if one was saved.
    async fn load_schema(&self) -> Result<Option<SchemaMap>>;
}

/// In-memory DataService for tests and examples.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    rows: HashMap<Uuid, ImageRow>,
    schema: Option<SchemaMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataService for MemoryStore {
    async fn get_all_rows(&self) -> Result<Vec<ImageRow>> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.values().cloned().collect())
    }

    async fn save_row(&self, row: &ImageRow) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.rows.insert(row.id, row.clone());
        Ok(())
    }

    async fn delete_row(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.rows.remove(&id);
        Ok(())
    }

    async fn clear_rows(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.rows.clear();
        Ok(())
    }

    async fn save_schema(&self, schema: &SchemaMap) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.schema = Some(schema.clone());
        Ok(())
    }

    async fn load_schema(&self) -> Result<Option<SchemaMap>> {
        let inner = self.inner.lock().await;
        Ok(inner.schema.clone())
    }
}
